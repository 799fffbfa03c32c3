use anyhow::Result;
use phpjs::run;
use std::env;
use std::fs;
use std::io;
use std::io::BufRead;
use std::path;

fn main() -> Result<()> {
    env_logger::init();
    let args = env::args().skip(1).collect::<Vec<String>>();
    if args.len() > 1 {
        println!("Incorrect Usage: phpjs [script]");
    } else if args.len() == 1 {
        run_file(path::Path::new(&args[0]))?;
    } else {
        run_prompt()?;
    }
    Ok(())
}

fn run_file(file_path: &path::Path) -> Result<()> {
    let source = fs::read_to_string(file_path)?;
    print!("{}", run(&source));
    Ok(())
}

fn run_prompt() -> Result<()> {
    for line in io::stdin().lock().lines() {
        println!("{}", run(&line?));
    }
    Ok(())
}
