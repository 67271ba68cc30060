use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command, ValueHint};
use log::LevelFilter;
use std::path::PathBuf;

use funcapprox_cli::commands::grid::{grid_config_from_arguments, run_grid_strict};
use funcapprox_cli::commands::info::run_info;
use funcapprox_cli::commands::unify::run_unify;

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("FUNCAPPROX_LOG", "error,funcapprox=info"))
        .init();

    let archive_arg = || {
        Arg::new("archive")
            .help("Path to a parameter archive (*.json for JSON, anything else for bincode)")
            .required(true)
            .value_parser(clap::value_parser!(PathBuf))
            .value_hint(ValueHint::FilePath)
    };

    let matches = Command::new("funcapprox")
        .version(clap::crate_version!())
        .author("Justin Sing <justincsing@gmail.com>")
        .about("Inspect function approximator parameters and sample them on grids")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("info")
                .about("Print the class, dimensions and values of a parameter archive")
                .arg(archive_arg()),
        )
        .subcommand(
            Command::new("unify")
                .about("Convert a parameter archive to the unified kernel/line representation")
                .arg(archive_arg())
                .arg(
                    Arg::new("output_file")
                        .short('o')
                        .long("output")
                        .help("Path the unified archive will be written to")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                ),
        )
        .subcommand(
            Command::new("grid")
                .about("Write basis function responses sampled on a regular input grid")
                .arg(archive_arg())
                .arg(
                    Arg::new("config")
                        .short('c')
                        .long("config")
                        .help("Path to a JSON grid configuration file")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("min")
                        .long("min")
                        .help("Lower grid bound per dimension, comma separated. Overrides the configuration file.")
                        .value_parser(clap::value_parser!(f64))
                        .value_delimiter(',')
                        .allow_negative_numbers(true),
                )
                .arg(
                    Arg::new("max")
                        .long("max")
                        .help("Upper grid bound per dimension, comma separated. Overrides the configuration file.")
                        .value_parser(clap::value_parser!(f64))
                        .value_delimiter(',')
                        .allow_negative_numbers(true),
                )
                .arg(
                    Arg::new("samples")
                        .short('n')
                        .long("samples")
                        .help("Number of samples per dimension, comma separated. Overrides the configuration file.")
                        .value_parser(clap::value_parser!(usize))
                        .value_delimiter(','),
                )
                .arg(
                    Arg::new("output_dir")
                        .short('o')
                        .long("output")
                        .help("Directory the grid files will be written to")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::DirPath),
                )
                .arg(
                    Arg::new("overwrite")
                        .long("overwrite")
                        .help("Replace grid files that already exist")
                        .action(ArgAction::SetTrue),
                ),
        )
        .help_template(
            "{usage-heading} {usage}\n\n\
             {about-with-newline}\n\
             Written by {author-with-newline}Version {version}\n\n\
             {all-args}{after-help}",
        )
        .get_matches();

    match matches.subcommand() {
        Some(("info", sub_m)) => handle_info(sub_m),
        Some(("unify", sub_m)) => handle_unify(sub_m),
        Some(("grid", sub_m)) => handle_grid(sub_m),
        _ => unreachable!("Subcommand is required by CLI configuration"),
    }
}

fn archive_path(matches: &ArgMatches) -> Result<&PathBuf> {
    matches
        .get_one::<PathBuf>("archive")
        .ok_or_else(|| anyhow::anyhow!("Missing archive path"))
}

fn handle_info(matches: &ArgMatches) -> Result<()> {
    let archive = archive_path(matches)?;
    let stdout = std::io::stdout();
    run_info(archive, &mut stdout.lock())
}

fn handle_unify(matches: &ArgMatches) -> Result<()> {
    let archive = archive_path(matches)?;
    let output = matches
        .get_one::<PathBuf>("output_file")
        .ok_or_else(|| anyhow::anyhow!("Missing output path"))?;
    run_unify(archive, output)?;
    Ok(())
}

fn handle_grid(matches: &ArgMatches) -> Result<()> {
    let archive = archive_path(matches)?;
    let config = grid_config_from_arguments(matches)?;
    log::info!(
        "[funcapprox::grid] Sampling {:?} into {:?}",
        archive,
        config.directory
    );
    run_grid_strict(archive, &config)
}
