fn main() {
    if driver::main().is_err() {
        std::process::exit(1);
    }
}
