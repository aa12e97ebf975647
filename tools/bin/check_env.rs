use clap::{Arg, Command};
use desk_tutor::config::check_environment;

fn print_section(title: &str) {
    println!();
    println!("== {} ==", title);
}

fn main() {
    let matches = Command::new("check_env")
        .about("Checks that the model credential and tutor settings are present and parse")
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .short('q')
                .help("Only set the exit status")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let report = check_environment(|name| std::env::var(name).ok());
    if !matches.get_flag("quiet") {
        print_section("Environment");
        for line in report.lines() {
            println!("{}", line);
        }
        print_section("Summary");
        if report.passed() {
            println!("Ready to run: desk-tutor run --images <DIR>");
        } else {
            println!("Set DASHSCOPE_API_KEY before starting a session:");
            println!("  export DASHSCOPE_API_KEY=your-api-key");
        }
    }

    if !report.passed() {
        std::process::exit(1);
    }
}
