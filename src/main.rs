fn main() {
    if let Err(err) = focusboard_lib::run() {
        eprintln!("focusboard: {err:?}");
        std::process::exit(1);
    }
}
