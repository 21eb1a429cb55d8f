use std::io;

fn main() {
    if let Some(value) = std::env::var_os("DICEHALL_LOG") {
        let format = dicehall_table::LogFormat::from_env_value(&value.to_string_lossy());
        dicehall_table::init_logging(format);
    }
    let mut out = io::stdout();
    let mut err = io::stderr();
    let code = dicehall_cli::run(std::env::args(), &mut out, &mut err);
    std::process::exit(code);
}
