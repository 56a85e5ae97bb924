use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use unlock_pdf::handlers::{
    Aes128Handler, Aes256Handler, OpenProtectionHandler, OwnerPasswordHandler,
    PasswordFallbackHandler, PkiEncryptionHandler, Rc4With128BitHandler, Rc4With40BitHandler,
    StandardRevision3Handler, X509SignatureHandler,
};
use unlock_pdf::{
    crack, crack_brute_force, default_handlers, parse_encrypt_info, read_pdf_bytes, AlphabetSpec,
    BruteForce, CrackResult, Permissions, SecurityHandler, WordlistFile,
};

#[derive(Parser)]
#[command(
    name = "unlockpdf",
    about = "Recover the password of an encrypted PDF document",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Try candidates from a wordlist file
    Crack {
        /// Path to the encrypted PDF file
        #[arg(long)]
        pdf: PathBuf,

        /// Path to a password wordlist (UTF-8 or UTF-16 with BOM)
        #[arg(long)]
        wordlist: PathBuf,

        /// Number of worker threads (default: hardware concurrency)
        #[arg(long, default_value_t = 0)]
        threads: usize,

        /// Print the result as JSON on stdout
        #[arg(long)]
        json: bool,

        /// Do not try the revision 5 derivation on revision 6 documents
        #[arg(long)]
        no_r5_fallback: bool,
    },

    /// Enumerate candidates over an alphabet and length range
    Brute {
        /// Path to the encrypted PDF file
        #[arg(long)]
        pdf: PathBuf,

        /// Minimum password length
        #[arg(long, default_value_t = 6)]
        min_length: usize,

        /// Maximum password length
        #[arg(long, default_value_t = 6)]
        max_length: usize,

        /// Include uppercase letters (selecting any class flag disables the
        /// others unless they are also given)
        #[arg(long)]
        uppercase: bool,

        /// Include lowercase letters
        #[arg(long)]
        lowercase: bool,

        /// Include digits
        #[arg(long)]
        digits: bool,

        /// Include special characters
        #[arg(long)]
        special: bool,

        /// Use exactly these characters instead of the class selection
        #[arg(long)]
        custom_chars: Option<String>,

        /// Number of worker threads (default: hardware concurrency)
        #[arg(long, default_value_t = 0)]
        threads: usize,

        /// Print the result as JSON on stdout
        #[arg(long)]
        json: bool,

        /// Do not try the revision 5 derivation on revision 6 documents
        #[arg(long)]
        no_r5_fallback: bool,
    },

    /// Show the document's encryption metadata without searching
    Info {
        /// Path to the PDF file
        #[arg(long)]
        pdf: PathBuf,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = err.print();
            return ExitCode::SUCCESS;
        }
        Err(err) => {
            let _ = err.print();
            return ExitCode::from(1);
        }
    };

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Crack {
            pdf,
            wordlist,
            threads,
            json,
            no_r5_fallback,
        } => {
            let bytes = read_pdf_bytes(&pdf)?;
            let source = WordlistFile::open(&wordlist)?;
            let handlers = build_handlers(no_r5_fallback);

            let result = crack(&bytes, &source, &handlers, threads)?;
            report(&result, json)
        }

        Commands::Brute {
            pdf,
            min_length,
            max_length,
            uppercase,
            lowercase,
            digits,
            special,
            custom_chars,
            threads,
            json,
            no_r5_fallback,
        } => {
            let bytes = read_pdf_bytes(&pdf)?;

            let any_class_selected = uppercase || lowercase || digits || special;
            let spec = AlphabetSpec {
                include_uppercase: !any_class_selected || uppercase,
                include_lowercase: !any_class_selected || lowercase,
                include_digits: !any_class_selected || digits,
                include_special: !any_class_selected || special,
                custom_characters: custom_chars,
            };
            let alphabet = spec.build()?;
            let space = BruteForce::new(alphabet, min_length, max_length)?;
            if let Some(total) = space.total_combinations() {
                println!("Searching {total} candidate passwords");
            }

            let handlers = build_handlers(no_r5_fallback);
            let result = crack_brute_force(&bytes, &space, &handlers, threads)?;
            report(&result, json)
        }

        Commands::Info { pdf } => {
            let bytes = read_pdf_bytes(&pdf)?;
            let info = parse_encrypt_info(&bytes)?;

            if !info.encrypted {
                println!("Document is not encrypted");
                return Ok(ExitCode::SUCCESS);
            }

            let summary = info.algorithm_summary();
            println!("Filter:      {}", ordash(&info.filter));
            if !info.sub_filter.is_empty() {
                println!("SubFilter:   {}", info.sub_filter);
            }
            println!("Version:     {}", info.version);
            println!("Revision:    {}", info.revision);
            println!("Key length:  {} bits", info.effective_key_length());
            println!("Encryption:  {}", summary.encryption);
            println!("Method:      {}", summary.method);
            println!(
                "Permissions: {}",
                Permissions::from_p_value(info.permissions)
            );
            if info.has_recipients {
                println!("Recipients:  present (certificate-based protection)");
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn ordash(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}

fn build_handlers(no_r5_fallback: bool) -> Vec<Box<dyn SecurityHandler>> {
    if !no_r5_fallback {
        return default_handlers();
    }
    vec![
        Box::new(OpenProtectionHandler),
        Box::new(PkiEncryptionHandler),
        Box::new(X509SignatureHandler),
        Box::new(Aes256Handler::without_r5_fallback()),
        Box::new(Aes128Handler),
        Box::new(StandardRevision3Handler),
        Box::new(Rc4With128BitHandler),
        Box::new(Rc4With40BitHandler),
        Box::new(PasswordFallbackHandler),
        Box::new(OwnerPasswordHandler),
    ]
}

fn report(result: &CrackResult, json: bool) -> Result<ExitCode> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(result).context("serializing result")?
        );
    }
    if result.success {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(2))
    }
}
