use phpjs::run;

fn assert_output(source: &str, expected: &str) {
    assert_eq!(run(source), expected, "program: {source}");
}

fn assert_output_contains(source: &str, expected: &str) {
    let output = run(source);
    assert!(
        output.contains(expected),
        "expected {expected:?} in output {output:?} of program: {source}"
    );
}

#[test]
fn arithmetic_and_concatenation() {
    assert_output(r#"$x=10; $y=20; echo "sum=" . ($x+$y);"#, "sum=30");
}

#[test]
fn function_with_closure_and_return() {
    assert_output(
        r#"function add($a,$b){ return $a+$b; } $s=add(2,3); echo $s;"#,
        "5",
    );
}

#[test]
fn if_elseif_else() {
    assert_output(
        r#"$n=0; if($n>0){echo "p";} elseif($n<0){echo "n";} else {echo "z";}"#,
        "z",
    );
}

#[test]
fn foreach_iterates_in_order() {
    assert_output(r#"$a=["x","y","z"]; foreach($a as $v){ echo $v; }"#, "xyz");
}

#[test]
fn for_loop_desugaring() {
    assert_output(r#"for($i=0;$i<3;$i=$i+1){ echo $i; }"#, "012");
}

#[test]
fn undefined_variable_surfaces_as_runtime_error() {
    assert_output_contains(
        r#"echo $missing;"#,
        "Runtime Error: Undefined variable '$missing'",
    );
}

#[test]
fn echo_before_a_runtime_error_is_kept() {
    assert_output(
        "echo \"a\"; echo $nope; echo \"b\";",
        "aRuntime Error: Undefined variable '$nope' at line 1",
    );
}

#[test]
fn runtime_errors_carry_the_source_line() {
    assert_output_contains("$a = 1;\n\necho $b;", "at line 3");
}

#[test]
fn plus_concatenates_unless_both_operands_are_numbers() {
    assert_output(r#"echo 1 + 2;"#, "3");
    assert_output(r#"echo "1" + 2;"#, "12");
    assert_output(r#"echo 1 + "2";"#, "12");
    assert_output(r#"echo null + 1;"#, "null1");
}

#[test]
fn dot_always_concatenates() {
    assert_output(r#"echo 1 . 2;"#, "12");
    assert_output(r#"echo "n=" . null;"#, "n=null");
    assert_output(r#"echo "b=" . true;"#, "b=true");
}

#[test]
fn numeric_operators_coerce_their_operands() {
    assert_output(r#"echo "10" - 4;"#, "6");
    assert_output(r#"echo "3" * "4";"#, "12");
    assert_output(r#"echo 10 / 4;"#, "2.5");
    assert_output(r#"echo 10 % 3;"#, "1");
    assert_output(r#"echo 2 ** 10;"#, "1024");
    assert_output(r#"echo -"5";"#, "-5");
    assert_output(r#"echo true + 1;"#, "true1");
}

#[test]
fn unary_bang_negates_truthiness() {
    assert_output(r#"echo !null;"#, "true");
    assert_output(r#"echo !0;"#, "false");
    assert_output(r#"echo !!"";"#, "true");
}

#[test]
fn zero_empty_string_and_empty_array_are_truthy() {
    assert_output(r#"if(0){echo "0";} if(""){echo "s";} if([]){echo "a";}"#, "0sa");
    assert_output(r#"if(null){echo "x";} else {echo "null falsy";}"#, "null falsy");
    assert_output(r#"if(false){echo "x";} else {echo "false falsy";}"#, "false falsy");
}

#[test]
fn loose_equality_coerces() {
    assert_output(r#"echo 10 == "10";"#, "true");
    assert_output(r#"echo true == 1;"#, "true");
    assert_output(r#"echo null == 0;"#, "false");
    assert_output(r#"echo null == null;"#, "true");
    assert_output(r#"echo 1 != "one";"#, "true");
}

#[test]
fn strict_equality_does_not_coerce() {
    assert_output(r#"echo 10 === "10";"#, "false");
    assert_output(r#"echo 10 === 10;"#, "true");
    assert_output(r#"echo true !== 1;"#, "true");
}

#[test]
fn logical_operators_return_the_deciding_value() {
    assert_output(r#"echo null || "fallback";"#, "fallback");
    assert_output(r#"echo "first" || "second";"#, "first");
    assert_output(r#"echo false && "unused";"#, "false");
    assert_output(r#"echo "lhs" && "rhs";"#, "rhs");
    // 0 is truthy, so it decides `||` and passes `&&` through
    assert_output(r#"echo 0 || "x";"#, "0");
}

#[test]
fn short_circuit_skips_the_right_operand() {
    assert_output(
        r#"$hit = "no"; false && ($hit = "yes"); echo $hit;"#,
        "no",
    );
    assert_output(
        r#"$hit = "no"; true || ($hit = "yes"); echo $hit;"#,
        "no",
    );
    assert_output(
        r#"$hit = "no"; true && ($hit = "yes"); echo $hit;"#,
        "yes",
    );
}

#[test]
fn inner_block_assignment_is_visible_to_the_enclosing_scope() {
    assert_output(r#"{ $a = "in"; echo $a; } echo $a;"#, "inin");
}

#[test]
fn var_declaration_is_block_scoped() {
    assert_output_contains(
        r#"{ var $a = "in"; } echo $a;"#,
        "Runtime Error: Undefined variable '$a'",
    );
}

#[test]
fn var_without_initializer_is_null() {
    assert_output(r#"var $a; echo $a;"#, "null");
}

#[test]
fn assignment_overwrites_the_enclosing_binding() {
    assert_output(r#"$a = "old"; { $a = "new"; } echo $a;"#, "new");
}

#[test]
fn closures_see_call_time_bindings() {
    assert_output(r#"function show(){ echo $later; } $later = "hi"; show();"#, "hi");
    assert_output(
        r#"$n = 0; function bump(){ $n = $n + 1; return $n; } bump(); bump(); echo $n;"#,
        "2",
    );
}

#[test]
fn functions_are_values_with_a_printable_form() {
    assert_output(r#"function f(){} echo f;"#, "<fn f>");
    assert_output(r#"echo strlen;"#, "<fn strlen>");
    assert_output(r#"function f(){ return 1; } $g = f; echo $g();"#, "1");
}

#[test]
fn return_without_value_yields_null() {
    assert_output(r#"function f(){ return; } echo f();"#, "null");
    assert_output(r#"function f(){ 1 + 1; } echo f();"#, "null");
}

#[test]
fn return_unwinds_a_single_call_frame() {
    assert_output(
        r#"function first($a){ foreach($a as $v){ if($v > 1){ return $v; } } return null; } echo first([1,2,3]);"#,
        "2",
    );
    assert_output(
        r#"function f(){ while(true){ return "done"; } } echo f();"#,
        "done",
    );
}

#[test]
fn top_level_return_is_a_runtime_error() {
    assert_output_contains(r#"return 1;"#, "Runtime Error: Cannot return from top-level code");
}

#[test]
fn calling_a_non_callable_is_a_runtime_error() {
    assert_output_contains(
        r#"$f = 1; $f();"#,
        "Runtime Error: Can only call functions and classes at line 1",
    );
}

#[test]
fn arity_mismatch_is_a_runtime_error() {
    assert_output_contains(
        r#"function add($a,$b){ return $a+$b; } add(1);"#,
        "Runtime Error: Expected 2 arguments but got 1",
    );
    assert_output_contains(
        r#"strlen("a","b");"#,
        "Runtime Error: Expected 1 arguments but got 2",
    );
}

#[test]
fn foreach_over_a_non_array_is_a_runtime_error() {
    assert_output_contains(
        r#"foreach("abc" as $c){ echo $c; }"#,
        "Runtime Error: Foreach expected array, got string",
    );
}

#[test]
fn foreach_binds_a_fresh_item_per_iteration() {
    assert_output(
        r#"$v = "outer"; foreach([1,2] as $v){} echo $v;"#,
        "outer",
    );
}

#[test]
fn arrays_nest_and_stringify() {
    assert_output(r#"echo [1, "two", null];"#, "[1, two, null]");
    assert_output(r#"$a = [[1,2],[3]]; foreach($a as $row){ echo count($row); }"#, "21");
}

#[test]
fn builtins_run_end_to_end() {
    assert_output(r#"echo strlen("hello");"#, "5");
    assert_output(r#"echo strtoupper("php") . strtolower("JS");"#, "PHPjs");
    assert_output(r#"echo trim("  x  ");"#, "x");
    assert_output(r#"echo count([1,2,3]);"#, "3");
    assert_output(r#"echo is_int(3) . is_int(3.5) . is_numeric("42");"#, "truefalsetrue");
}

#[test]
fn while_loops_run_to_completion() {
    assert_output(r#"$i = 0; $out = ""; while($i < 3){ $out = $out . $i; $i = $i + 1; } echo $out;"#, "012");
}

#[test]
fn nested_and_recursive_calls() {
    assert_output(
        r#"function fib($n){ if($n < 2){ return $n; } return fib($n-1) + fib($n-2); } echo fib(10);"#,
        "55",
    );
    assert_output(
        r#"function twice($f, $x){ return $f($f($x)); } function inc($n){ return $n + 1; } echo twice(inc, 3);"#,
        "5",
    );
}

#[test]
fn parse_errors_skip_the_declaration_but_later_code_runs() {
    assert_output(r#"var ; echo "ok";"#, "ok");
    assert_output(r#"1 = 2; echo "after";"#, "after");
}

#[test]
fn comments_and_line_endings_are_transparent() {
    assert_output("// leading\r\n$x = 1; /* mid */ echo $x;\r\n", "1");
}

#[test]
fn string_quote_escapes() {
    // a backslash before the matching quote stays in the raw payload
    assert_output(r#"echo "a\"b";"#, r#"a\"b"#);
    assert_output(r#"echo 'it\'s';"#, r#"it\'s"#);
}

#[test]
fn number_formatting_strips_integral_fractions() {
    assert_output(r#"echo 2.50 + 2.50;"#, "5");
    assert_output(r#"echo 0.1 + 0.2;"#, "0.30000000000000004");
}
