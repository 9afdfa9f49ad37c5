fn main() {
    if let Err(err) = csv_harmonize::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
