fn main() {
    if let Err(err) = playground_lib::run() {
        eprintln!("[playground] {err:?}");
        std::process::exit(1);
    }
}
