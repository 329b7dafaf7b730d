fn main() {
    if let Err(e) = order_desk_lib::run() {
        eprintln!("order-desk: {e:#}");
        std::process::exit(1);
    }
}
