use std::fs;

use clap::{Parser, Subcommand};

use henkan_cli::commands::dict_ops::SourceKind;
use henkan_cli::commands::{config_ops, convert_ops, dict_ops, record_ops, EnginePaths};
use henkan_cli::CliError;
use henkan_core::settings;

#[derive(Parser)]
#[command(name = "henkantool", about = "Henkan conversion diagnostics")]
struct Cli {
    /// Custom settings TOML applied before anything runs
    #[arg(long, global = true)]
    settings: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert a reading and show segments with their candidates
    Convert {
        /// Dictionary (compiled or text source)
        dict_file: String,
        /// Dependent-word grammar source
        grammar_file: String,
        /// Feature model (compiled or text source)
        model_file: String,
        /// Reading to convert
        reading: String,
        /// Example corpus (compiled or text source)
        #[arg(long)]
        corpus: Option<String>,
        /// Learning store to use
        #[arg(long)]
        record: Option<String>,
        /// Candidates shown per segment
        #[arg(short, long, default_value = "10")]
        n: usize,
        /// Convert literals back to readings
        #[arg(long)]
        reverse: bool,
        /// Commit the top candidates and learn from them
        #[arg(long)]
        commit: bool,
        /// Output as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Compile a text source to its binary form
    CompileDict {
        /// Kind of source
        #[arg(long, value_enum, default_value = "dict")]
        kind: SourceKind,
        /// Input text file
        input: String,
        /// Output binary file
        output: String,
    },
    /// Print the sections of a learning store
    DumpRecord {
        /// Learning store snapshot
        record_file: String,
        /// Only this section
        #[arg(long)]
        section: Option<String>,
        /// Output as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Export default settings as TOML
    SettingsExport,
    /// Validate a custom settings TOML file
    SettingsValidate {
        /// Path to the TOML file
        file: String,
    },
}

fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    if let Some(path) = &cli.settings {
        settings::init_custom(fs::read_to_string(path)?)?;
    }

    match cli.command {
        Command::Convert {
            dict_file,
            grammar_file,
            model_file,
            reading,
            corpus,
            record,
            n,
            reverse,
            commit,
            json,
        } => convert_ops::convert(&convert_ops::ConvertOptions {
            paths: EnginePaths {
                dict: &dict_file,
                grammar: &grammar_file,
                model: &model_file,
                corpus: corpus.as_deref(),
            },
            reading: &reading,
            record: record.as_deref(),
            n,
            reverse,
            commit,
            json,
        }),
        Command::CompileDict {
            kind,
            input,
            output,
        } => dict_ops::compile(kind, &input, &output),
        Command::DumpRecord {
            record_file,
            section,
            json,
        } => record_ops::dump(&record_file, section.as_deref(), json),
        Command::SettingsExport => {
            config_ops::settings_export();
            Ok(())
        }
        Command::SettingsValidate { file } => config_ops::settings_validate(&file),
    }
}
