use chrono::Local;
use colored::*;
use env_logger::fmt::Formatter;
use log::{Level, Record};
use std::io::Write;

pub fn init_logger(log_level: &str) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level));
    builder.format(format_log);

    // actix is chatty at debug level
    builder.filter(Some("actix_server"), log::LevelFilter::Warn);
    builder.filter(Some("actix_web"), log::LevelFilter::Warn);
    builder.filter(Some("notify"), log::LevelFilter::Warn);

    // A second init (tests, repeated subcommands) is harmless.
    let _ = builder.try_init();
}

fn level_label(level: Level) -> ColoredString {
    match level {
        Level::Error => "ERROR".truecolor(255, 0, 0),
        Level::Warn => "WARN".truecolor(255, 165, 0),
        Level::Info => "INFO".truecolor(0, 255, 255),
        Level::Debug => "DEBUG".truecolor(138, 43, 226),
        Level::Trace => "TRACE".truecolor(255, 105, 180),
    }
}

fn format_log(buf: &mut Formatter, record: &Record) -> std::io::Result<()> {
    let message = format!(
        "{} [{}] - {}",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        level_label(record.level()),
        record.args()
    );

    writeln!(buf, "{}", message)
}

pub fn print_banner(host: &str, port: u16, steps: usize, recommendations: usize) {
    let teal = (0, 200, 170);
    let sky = (63, 156, 255);

    let border = "=".repeat(72);
    println!("{}", border.truecolor(teal.0, teal.1, teal.2));
    println!("{}", "   w a y f i n d e r".truecolor(sky.0, sky.1, sky.2).bold());
    println!();
    println!("{}", "🧭 Collaborator server is running!".green());
    println!("{}", format!("   - Address: http://{}:{}", host, port).cyan());
    println!(
        "{}",
        format!("   - Wizard: {} steps, {} recommendations", steps, recommendations).cyan()
    );
    println!("{}", border.truecolor(teal.0, teal.1, teal.2));
}
