use clap::Parser;
use datatoexcel_rs::cli::{run_conversion, ConversionOptions};
use datatoexcel_rs::flatten::{EmptyTablePolicy, FlattenOptions};
use datatoexcel_rs::generator::XlsxTablesGeneratorOptions;
use datatoexcel_rs::naming::NamingRegistry;
use datatoexcel_rs::parser::xml::XmlParserOptions;
use datatoexcel_rs::parser::FileType;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the input file
    #[arg(short = 'i', long = "inputpath", value_name = "FILE")]
    input_path: PathBuf,

    /// Path to the output file
    #[arg(short = 'o', long = "outputpath", value_name = "FILE")]
    output_path: PathBuf,

    /// Input file is a .json file
    #[arg(short = 'j', long, group = "input_type")]
    json: bool,
    /// Input file is a .xml file
    #[arg(short = 'x', long, group = "input_type")]
    xml: bool,
    /// Input file is a .yml file
    #[arg(short = 'y', long, group = "input_type")]
    yml: bool,

    /// JSON file with column and table labels (default: the bundled registry)
    #[arg(long, value_name = "FILE", conflicts_with = "no_registry")]
    registry: Option<PathBuf>,
    /// Keep raw column and table names
    #[arg(long)]
    no_registry: bool,

    /// What to do with tables left without columns
    #[arg(long = "empty-tables", value_enum, default_value_t = EmptyTablePolicy::Omit)]
    empty_tables: EmptyTablePolicy,

    #[command(flatten)]
    xml_options: XmlParserOptions,

    #[command(flatten)]
    generator_options: XlsxTablesGeneratorOptions,
}

impl Cli {
    fn file_type(&self) -> Option<FileType> {
        if self.json {
            Some(FileType::Json)
        } else if self.xml {
            Some(FileType::Xml)
        } else if self.yml {
            Some(FileType::Yml)
        } else {
            None
        }
    }

    fn registry(&self) -> anyhow::Result<NamingRegistry> {
        if self.no_registry {
            return Ok(NamingRegistry::default());
        }
        Ok(match &self.registry {
            Some(path) => NamingRegistry::from_path(path)?,
            None => NamingRegistry::builtin()?,
        })
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let options = ConversionOptions {
        file_type: cli.file_type(),
        registry: cli.registry()?,
        flatten: FlattenOptions {
            empty_tables: cli.empty_tables,
        },
        xml: cli.xml_options,
        generator: cli.generator_options,
    };
    run_conversion(&cli.input_path, &cli.output_path, options)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let output_path = cli.output_path.clone();

    let start = Instant::now();
    match run(cli) {
        Ok(()) => {
            log::info!(
                "Excel file with tables created in {:.4} seconds: {}",
                start.elapsed().as_secs_f64(),
                output_path.display()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
