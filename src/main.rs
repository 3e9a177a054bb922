fn main() {
    if let Err(err) = kodeka::cli::main() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
