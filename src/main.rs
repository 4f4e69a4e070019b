use clap::{Args as ClapArgs, Parser, Subcommand};
use colored::Colorize;
use env_logger::Env;
use log::{debug, error, warn};
use std::fmt;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use text_io::try_read;

mod libqti;

use crate::libqti::convert::{run_converter, DEFAULT_CONVERTER};
use crate::libqti::error::Result;
use crate::libqti::pipeline::{self, Options, Source, DEFAULT_CSV_FILE};
use crate::libqti::writer::renumber_file;

#[derive(Parser, Debug)]
#[command(name = "qti2text")]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,

    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Turn a Canvas QTI export into a text quiz and a CSV of its questions
    Convert(ConvertArgs),
    /// Number the questions of a text quiz 1, 2, 3, …
    Renumber { file: PathBuf },
}

#[derive(ClapArgs, Debug)]
struct ConvertArgs {
    /// QTI .zip export or an already unpacked folder; asked for when missing
    input: Option<PathBuf>,
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    out_dir: PathBuf,
    #[arg(long, value_name = "DIR", default_value = ".")]
    work_dir: PathBuf,
    #[arg(long, value_name = "FILE", default_value = DEFAULT_CSV_FILE)]
    csv: PathBuf,
    #[arg(long, default_value = "false")]
    renumber: bool,
    /// Run the quiz file back through a text-to-QTI converter
    #[arg(long, default_value = "false")]
    convert: bool,
    #[arg(long, value_name = "PROGRAM", default_value = DEFAULT_CONVERTER)]
    converter: String,
}

impl Default for ConvertArgs {
    fn default() -> Self {
        let options = Options::default();
        ConvertArgs {
            input: None,
            out_dir: options.out_dir,
            work_dir: options.work_dir,
            csv: options.csv_file,
            renumber: false,
            convert: false,
            converter: DEFAULT_CONVERTER.to_string(),
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or(args.log_level)).init();

    let result = match args.command.unwrap_or(Commands::Convert(ConvertArgs::default())) {
        Commands::Convert(convert_args) => convert(convert_args),
        Commands::Renumber { file } => renumber_file(&file).map(|count| {
            println!("{}", format!("Renumbered {count} questions in {:?}", file).green());
        }),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", format!("{e}").red());
            ExitCode::FAILURE
        }
    }
}

fn convert(args: ConvertArgs) -> Result<()> {
    let input = match args.input {
        Some(path) => path,
        None => prompt_for_input()?,
    };
    let source = Source::detect(&input)?;
    debug!("[Setup] Reading quiz export from {:?}", source.path());

    let options = Options {
        out_dir: args.out_dir,
        work_dir: args.work_dir,
        csv_file: args.csv,
    };
    let outcome = pipeline::run(&source, &options)?;

    if let Some(csv_file) = &outcome.csv_file {
        println!("{}", format!("Question details saved to {:?}", csv_file).green());
    }
    let Some(quiz_file) = outcome.quiz_file else {
        println!("{}", "The quiz needs a title, so no quiz file was written.".yellow());
        return Ok(());
    };
    println!(
        "{}",
        format!("Wrote {} questions to {:?}", outcome.questions, quiz_file).green()
    );

    if args.renumber {
        renumber_file(&quiz_file)?;
    }
    if args.convert {
        match run_converter(&args.converter, &quiz_file) {
            Ok(()) => println!("{}", "Conversion to QTI format successful.".green()),
            Err(e) => warn!("{}", format!("Conversion to QTI format failed: {e}").yellow()),
        }
    }
    Ok(())
}

fn prompt_for_input() -> io::Result<PathBuf> {
    print!("{} ", "Input path to QTI file (a .zip file or an unpacked folder):".cyan());
    io::stdout().flush()?;
    let answer: Result<String, text_io::Error> = try_read!("{}\n");
    input_path_from_answer(answer)
}

fn input_path_from_answer<E: fmt::Debug>(answer: Result<String, E>) -> io::Result<PathBuf> {
    let line = answer.map_err(|e| {
        io::Error::new(io::ErrorKind::UnexpectedEof, format!("no input path read: {e:?}"))
    })?;
    match clean_input_path(&line) {
        "" => Err(io::Error::new(io::ErrorKind::UnexpectedEof, "no input path given")),
        path => Ok(PathBuf::from(path)),
    }
}

/// Drops the whitespace and quotes a terminal adds around dragged-in paths.
fn clean_input_path(line: &str) -> &str {
    line.trim().trim_matches(|c| c == '"' || c == '\'')
}
