use std::process;

fn main() {
    match litprog_cli::run() {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("litprog error: {err:#}");
            process::exit(1);
        }
    }
}
