fn main() -> Result<(), Box<dyn std::error::Error>> {
    configure_feedback::cli::main()
}
