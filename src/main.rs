fn main() -> std::process::ExitCode {
    lockit_lib::run()
}
