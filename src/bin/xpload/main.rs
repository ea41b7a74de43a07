use anyhow::Result;
use env_logger::{Builder, Env};

mod cli;
mod util;
mod cmd_add;
mod cmd_config;
mod cmd_fetch;
mod cmd_push;
mod cmd_show;

fn init_logger(verbose: u8) {
    // RUST_LOG имеет приоритет, иначе уровень от -v (по умолчанию warn).
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp_millis()
        .init();
}

fn main() {
    let cli = cli::Cli::parse();
    init_logger(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(util::exit_code(&e));
    }
}

fn run(cli: cli::Cli) -> Result<()> {
    let config = cli.config.as_str();
    match cli.cmd {
        cli::Cmd::Show { component, id } =>
            cmd_show::exec(config, component, id, cli.dump),

        cli::Cmd::Add { what: cli::AddCmd::Tag { name, tag_type, status, domains } } =>
            cmd_add::exec_tag(name, tag_type, status, domains),

        cli::Cmd::Add { what: cli::AddCmd::Pil { tag, domain, payload, start, end } } =>
            cmd_add::exec_pil(tag, domain, payload, start, end),

        cli::Cmd::Push =>
            cmd_push::exec(config),

        cli::Cmd::Fetch { tag, domain, start } =>
            cmd_fetch::exec(config, tag, domain, start, cli.dump),

        cli::Cmd::Config { field } =>
            cmd_config::exec(config, field),
    }
}
