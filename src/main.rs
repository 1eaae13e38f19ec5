//! a4draft – command-line front end for the A4 paginator and exporter.
//!
//! Usage:
//!   a4draft render <input.html> [output.pdf] [--paginate] [--title "Report"]
//!   a4draft pages <input.html> [--paginate]
//!   a4draft save <input.html>
//!   a4draft restore [output.html]
//!   a4draft reset
//!   a4draft export [output-dir]
//!
//! Common flags: `--config <file.json>`, `--lang <ko|en|ja|zh>`,
//! `--store <file.json>` (draft store, default `a4draft-store.json`).

use std::{env, fs, path::PathBuf, process};

use a4_draft::controller::{Commands, Controller, Notice};
use a4_draft::export::FileSink;
use a4_draft::i18n::{t, Lang};
use a4_draft::pipeline::{generate_pdf, paginate_markup};
use a4_draft::storage::{DraftStore, FileStore, SystemClock};
use a4_draft::{AppConfig, Error, PageBudget};

const DEFAULT_STORE: &str = "a4draft-store.json";

#[derive(Default)]
struct Args {
    command: String,
    positional: Vec<PathBuf>,
    paginate: bool,
    title: Option<String>,
    config: Option<PathBuf>,
    lang: Option<Lang>,
    store: Option<PathBuf>,
}

fn main() {
    env_logger::init();

    let argv: Vec<String> = env::args().collect();
    let prog = argv.first().map(String::as_str).unwrap_or("a4draft");
    let args = match parse_args(argv.get(1..).unwrap_or_default()) {
        Ok(a) => a,
        Err(msg) => {
            eprintln!("{msg}");
            print_usage(prog);
            process::exit(1);
        }
    };

    if args.command == "help" {
        print_usage(prog);
        return;
    }

    if let Err(e) = run(&args) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn parse_args(raw: &[String]) -> Result<Args, String> {
    let mut args = Args::default();
    let mut iter = raw.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--paginate" | "-p" => args.paginate = true,
            "--title" | "-t" => args.title = Some(flag_value(&mut iter, arg)?),
            "--config" | "-c" => args.config = Some(PathBuf::from(flag_value(&mut iter, arg)?)),
            "--store" | "-s" => args.store = Some(PathBuf::from(flag_value(&mut iter, arg)?)),
            "--lang" | "-l" => {
                let code = flag_value(&mut iter, arg)?;
                args.lang = Some(code.parse().map_err(|e: Error| e.to_string())?);
            }
            "--help" | "-h" => args.command = "help".to_string(),
            other if other.starts_with('-') => return Err(format!("Unknown flag: {other}")),
            word if args.command.is_empty() => args.command = word.to_string(),
            path => args.positional.push(PathBuf::from(path)),
        }
    }
    if args.command.is_empty() {
        return Err("No command given.".to_string());
    }
    Ok(args)
}

fn flag_value<'a>(iter: &mut impl Iterator<Item = &'a String>, flag: &str) -> Result<String, String> {
    iter.next()
        .cloned()
        .ok_or_else(|| format!("Flag {flag} needs a value"))
}

fn load_config(args: &Args) -> a4_draft::Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => AppConfig::from_json(&fs::read_to_string(path)?)?,
        None => AppConfig::without_delays(),
    };
    if args.paginate {
        config.budget = PageBudget::a4_content(config.margin_mm);
    }
    if let Some(title) = &args.title {
        config.title = title.clone();
    }
    if let Some(lang) = args.lang {
        config.lang = lang;
    }
    Ok(config)
}

fn input_markup(args: &Args) -> a4_draft::Result<(PathBuf, String)> {
    let path = args
        .positional
        .first()
        .cloned()
        .ok_or_else(|| Error::Config("no input file specified".into()))?;
    let markup = fs::read_to_string(&path)?;
    Ok((path, markup))
}

fn controller(args: &Args, config: AppConfig) -> Controller<FileStore, SystemClock> {
    let store = FileStore::new(args.store.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_STORE)));
    let mut c = Controller::new(config, DraftStore::new(store, SystemClock));
    if let Some(lang) = args.lang {
        c.set_lang(lang);
    }
    c
}

/// Print a command outcome; a failure notice ends the process.
fn report(notice: &Notice) -> a4_draft::Result<()> {
    match &notice.detail {
        Some(detail) => {
            eprintln!("{}: {detail}", notice.message);
            process::exit(1);
        }
        None => {
            eprintln!("{}", notice.message);
            Ok(())
        }
    }
}

fn run(args: &Args) -> a4_draft::Result<()> {
    let config = load_config(args)?;
    match args.command.as_str() {
        "render" => {
            let (input, markup) = input_markup(args)?;
            let output = args.positional.get(1).cloned().unwrap_or_else(|| {
                let mut o = input.clone();
                o.set_extension("pdf");
                o
            });
            let (bytes, pages, _) = generate_pdf(&markup, &config)?;
            if let Some(parent) = output.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            fs::write(&output, &bytes)?;
            eprintln!(
                "Wrote '{}' ({} bytes, {} {})",
                output.display(),
                bytes.len(),
                pages.count,
                t(config.lang, "pages")
            );
            Ok(())
        }
        "pages" => {
            let (_, markup) = input_markup(args)?;
            let pages = paginate_markup(&markup, &config);
            println!("{}", serde_json::to_string_pretty(&pages)?);
            Ok(())
        }
        "save" => {
            let (_, markup) = input_markup(args)?;
            let mut c = controller(args, config);
            c.set_content(markup);
            report(&c.save()?)
        }
        "restore" => {
            let mut c = controller(args, config);
            if !c.hydrate() {
                eprintln!("{}", t(c.lang(), "content_placeholder"));
                return Ok(());
            }
            match args.positional.first() {
                Some(path) => fs::write(path, c.content())?,
                None => println!("{}", c.content()),
            }
            Ok(())
        }
        "reset" => {
            let mut c = controller(args, config);
            report(&c.reset()?)
        }
        "export" => {
            let dir = args.positional.first().cloned().unwrap_or_else(|| PathBuf::from("."));
            let mut c = controller(args, config).with_sink(FileSink::new(dir));
            c.hydrate();
            report(&c.export_document()?)
        }
        other => Err(Error::Config(format!("unknown command '{other}'"))),
    }
}

fn print_usage(prog: &str) {
    eprintln!("a4draft – A4 paginator and image-based PDF exporter");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  {prog} render <input.html> [output.pdf]   Paginate and export markup to PDF");
    eprintln!("  {prog} pages <input.html>                 Print the page fragments as JSON");
    eprintln!("  {prog} save <input.html>                  Store markup as the draft");
    eprintln!("  {prog} restore [output.html]              Print or write the stored draft");
    eprintln!("  {prog} reset                              Discard the stored draft");
    eprintln!("  {prog} export [output-dir]                Export the stored draft to PDF");
    eprintln!();
    eprintln!("Flags:");
    eprintln!("  --paginate, -p   Split into A4 pages (default: one page)");
    eprintln!("  --title, -t      Document title in PDF metadata");
    eprintln!("  --config, -c     JSON config file");
    eprintln!("  --lang, -l       UI language: ko, en, ja, zh");
    eprintln!("  --store, -s      Draft store file (default: {DEFAULT_STORE})");
    eprintln!("  --help, -h       Print this message");
}
