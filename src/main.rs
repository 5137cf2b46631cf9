use clap::Parser;
use majas::format::{Format, OptionBag, OptionValue, Source};
use majas::formats;
use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(
    name = "majas",
    about = "Markdown And JSON Are Similar — format-agnostic structured data converter"
)]
struct Cli {
    /// Input file (default: stdin)
    input: Option<PathBuf>,

    /// Source format
    #[arg(short, long)]
    from: Option<String>,

    /// Target format; if absent, print the resolved input format and stop
    #[arg(short, long)]
    to: Option<String>,

    /// Output file, or output root for filesystem targets (default: stdout /
    /// current directory)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Infer the input format from the file extension; --from is the
    /// fallback on ambiguous input
    #[arg(short, long)]
    infer: bool,

    /// Pass an option to the input format
    #[arg(short = 'I', long = "in-option", value_name = "KEY[=VALUE]")]
    in_options: Vec<String>,

    /// Pass an option to the output format
    #[arg(short = 'O', long = "out-option", value_name = "KEY[=VALUE]")]
    out_options: Vec<String>,

    /// List available formats
    #[arg(long)]
    list_formats: bool,

    /// Show the options a format accepts
    #[arg(long, value_name = "FORMAT")]
    format_help: Option<String>,
}

fn die(msg: &str) -> ! {
    eprintln!("error: {}", msg);
    process::exit(1);
}

fn option_bag(entries: &[String]) -> OptionBag {
    let mut bag = OptionBag::new();
    for entry in entries {
        match entry.split_once('=') {
            Some((key, value)) => bag.insert(key.to_string(), OptionValue::Str(value.to_string())),
            None => bag.insert(entry.clone(), OptionValue::Flag),
        };
    }
    bag
}

fn print_formats() {
    println!("Formats:");
    for f in formats::FORMATS {
        let mut names = vec![f.display_name];
        names.extend(f.aliases);
        println!("  {}", names.join(", "));
    }
    println!();
    println!("Note: format names are case-insensitive.");
}

fn print_format_help(format: &Format) {
    let mut names = vec![format.display_name];
    names.extend(format.aliases);
    println!("{}", names.join(", "));
    println!("  Accepts: {}", format.accepts);
    println!("  Emits: {}", format.emits);
    println!();
    if format.options.is_empty() {
        println!("(no options)");
        return;
    }
    println!("Options:");
    let width = format
        .options
        .iter()
        .map(|o| o.name.len())
        .max()
        .unwrap_or(0);
    for opt in format.options {
        match opt.default {
            Some(default) => println!(
                "  {:width$}  {} (default: {})",
                opt.name, opt.description, default
            ),
            None => println!("  {:width$}  {}", opt.name, opt.description),
        }
    }
}

fn resolve_source_format(cli: &Cli) -> &'static Format {
    if cli.infer {
        let inferred = cli
            .input
            .as_deref()
            .and_then(formats::infer_format)
            .or_else(|| {
                cli.from
                    .as_deref()
                    .and_then(|name| formats::find_format(name).ok())
            });
        return inferred.unwrap_or_else(|| {
            die(&match &cli.input {
                Some(p) => format!("could not infer input format for {}", p.display()),
                None => "could not infer input format".to_string(),
            })
        });
    }
    let name = cli
        .from
        .as_deref()
        .unwrap_or_else(|| die("missing --from option"));
    formats::find_format(name).unwrap_or_else(|e| die(&e.to_string()))
}

fn main() {
    let cli = Cli::parse();

    if cli.list_formats {
        print_formats();
        return;
    }
    if let Some(name) = &cli.format_help {
        match formats::find_format(name) {
            Ok(format) => print_format_help(format),
            Err(e) => die(&e.to_string()),
        }
        return;
    }

    let source_format = resolve_source_format(&cli);

    let Some(to) = &cli.to else {
        println!("{}", source_format.display_name);
        return;
    };
    let target_format = formats::find_format(to).unwrap_or_else(|e| die(&e.to_string()));

    let input = match &cli.input {
        Some(path) => Source::Path(path.clone()),
        None => {
            let mut bytes = Vec::new();
            std::io::stdin()
                .read_to_end(&mut bytes)
                .unwrap_or_else(|e| die(&format!("cannot read stdin: {}", e)));
            Source::Bytes(bytes)
        }
    };

    let result = majas::convert(
        source_format,
        target_format,
        &input,
        &option_bag(&cli.in_options),
        &option_bag(&cli.out_options),
        cli.out.as_deref(),
    )
    .unwrap_or_else(|e| die(&e.to_string()));

    match result {
        majas::Emitted::Text(text) => match &cli.out {
            Some(path) => fs::write(path, &text)
                .unwrap_or_else(|e| die(&format!("cannot write {}: {}", path.display(), e))),
            None => {
                print!("{}", text);
                if !text.ends_with('\n') {
                    println!();
                }
            }
        },
        majas::Emitted::Tree(path) => {
            eprintln!("wrote filesystem tree at {}", path.display());
        }
    }
}
