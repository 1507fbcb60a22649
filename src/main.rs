fn main() {
    if let Err(err) = gray_tranzit::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
