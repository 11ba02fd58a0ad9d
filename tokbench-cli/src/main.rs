fn main() {
    std::process::exit(tokbench_cli::run());
}
