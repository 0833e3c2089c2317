use clap::{Arg, Command};
use log::LevelFilter;
use manifest_scanner::config::{Config, Direction, DEFAULT_CONFIG_PATH};
use manifest_scanner::encoding::decode_text;
use manifest_scanner::mail::{InboundMail, MailScanner};
use manifest_scanner::manifest::{ContainerRecord, ManifestParser};
use manifest_scanner::report::{self, KeywordSummary};
use std::process;

fn main() {
    let matches = Command::new("manifest-scanner")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Flags hazardous cargo in import/export container manifests")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value(DEFAULT_CONFIG_PATH),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .value_name("FILE")
                .help("Generate a default configuration file")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("test-config")
                .long("test-config")
                .help("Test configuration validity")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("list-keywords")
                .long("list-keywords")
                .help("List configured keywords and their Chinese names")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("parse")
                .long("parse")
                .value_name("FILE")
                .help("Parse a manifest .txt file and print matched containers")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("test-email")
                .long("test-email")
                .value_name("FILE")
                .help("Scan a saved .eml message the way the mailbox worker would")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("direction")
                .long("direction")
                .value_name("DIRECTION")
                .help("Mailbox direction for --test-email (import or export)")
                .default_value("export"),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .value_name("FORMAT")
                .help("Output format for matched containers (table, csv, json)")
                .default_value("table"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("DIR")
                .help("Directory for the CSV report (overrides report.output_dir)")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let log_level = if matches.get_flag("verbose") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if let Some(generate_path) = matches.get_one::<String>("generate-config") {
        generate_default_config(generate_path);
        return;
    }

    let config_path = matches
        .get_one::<String>("config")
        .map(String::as_str)
        .unwrap_or(DEFAULT_CONFIG_PATH);

    let config = match Config::load_or_default(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e:#}");
            process::exit(1);
        }
    };

    if matches.get_flag("test-config") {
        println!("🔍 Testing configuration: {config_path}");
        match config.validate() {
            Ok(()) => {
                println!("Import keywords: {}", config.keywords.import.len());
                println!("Export keywords: {}", config.keywords.export.len());
                println!("Translations: {}", config.keyword_translation.len());
                println!("✅ Configuration is valid");
            }
            Err(e) => {
                println!("❌ Configuration validation failed:");
                println!("Error: {e}");
                process::exit(1);
            }
        }
        return;
    }

    if matches.get_flag("list-keywords") {
        list_keywords(&config);
        return;
    }

    let format = matches
        .get_one::<String>("format")
        .map(String::as_str)
        .unwrap_or("table");
    let output_dir = config
        .report
        .resolve_output_dir(matches.get_one::<String>("output").map(String::as_str));

    if let Some(manifest_file) = matches.get_one::<String>("parse") {
        parse_manifest_file(&config, manifest_file, format, output_dir);
        return;
    }

    if let Some(email_file) = matches.get_one::<String>("test-email") {
        let direction_arg = matches
            .get_one::<String>("direction")
            .map(String::as_str)
            .unwrap_or("export");
        let Some(direction) = Direction::parse(direction_arg) else {
            eprintln!("❌ Unsupported direction: {direction_arg}. Use import or export");
            process::exit(1);
        };
        test_email_file(&config, email_file, direction, format, output_dir);
        return;
    }

    eprintln!("Nothing to do. Use --parse FILE or --test-email FILE (see --help)");
    process::exit(2);
}

fn generate_default_config(path: &str) {
    let config = Config::default();
    match config.to_file(path) {
        Ok(()) => {
            println!("Default configuration written to: {path}");
            println!("Please edit the keywords and reply settings to suit your terminal.");
        }
        Err(e) => {
            eprintln!("Error writing configuration file: {e:#}");
            process::exit(1);
        }
    }
}

fn list_keywords(config: &Config) {
    for direction in [Direction::Import, Direction::Export] {
        println!("📋 {direction} keywords:");
        for keyword in config.keywords_for(direction) {
            let translated = config
                .keyword_translation
                .get(keyword)
                .unwrap_or("(no translation)");
            println!("  • {keyword} → {translated}");
        }
        println!();
    }
}

fn read_file(path: &str) -> Vec<u8> {
    match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("❌ Error reading {path}: {e}");
            process::exit(1);
        }
    }
}

fn print_records(records: &[ContainerRecord], format: &str) {
    let rendered = match format.to_lowercase().as_str() {
        "table" => Ok(report::render_table(records)),
        "csv" => Ok(report::render_csv(records)),
        "json" => report::render_json(records),
        _ => {
            eprintln!("❌ Unsupported format: {format}. Use table, csv, or json");
            process::exit(1);
        }
    };

    match rendered {
        Ok(text) => println!("{text}"),
        Err(e) => {
            eprintln!("❌ Failed to render records: {e:#}");
            process::exit(1);
        }
    }
}

fn save_report(dir: &str, file_name: &str, records: &[ContainerRecord]) {
    match report::write_report(dir, file_name, records) {
        Ok(path) => println!("📄 Report written to: {}", path.display()),
        Err(e) => {
            eprintln!("❌ {e:#}");
            process::exit(1);
        }
    }
}

fn parse_manifest_file(config: &Config, manifest_file: &str, format: &str, output_dir: &str) {
    let decoded = decode_text(&read_file(manifest_file));
    let parser = ManifestParser::new(config.parse_settings(Direction::Export));

    println!("🧪 Parsing manifest: {manifest_file}");
    println!("   Encoding: {}", decoded.encoding);
    println!("   Format: {}", parser.classify(&decoded.text));
    println!();

    let Some(records) = parser.parse(&decoded.text) else {
        println!("📭 No keyword-matched containers found");
        return;
    };

    println!("🎯 {} matched containers", records.len());
    print_records(&records, format);

    let summary = KeywordSummary::from_records(&records, &parser.settings().keywords);
    println!("🔑 Keyword hits: {}", summary.total());
    for (keyword, count) in summary.counts.iter().filter(|(_, count)| *count > 0) {
        println!("  {keyword}: {count}");
    }

    let report_name = report::report_file_name(&config.report.file_prefix, manifest_file);
    save_report(output_dir, &report_name, &records);
}

fn test_email_file(
    config: &Config,
    email_file: &str,
    direction: Direction,
    format: &str,
    output_dir: &str,
) {
    let raw = read_file(email_file);
    let Some(mail) = InboundMail::from_rfc822(email_file, &raw) else {
        eprintln!("❌ {email_file} is not a parsable email message");
        process::exit(1);
    };

    println!("🧪 Testing email file: {email_file} ({direction} mailbox)");
    println!("   From: {}", mail.from);
    println!("   Subject: {}", mail.subject);
    println!("   Attachments: {}", mail.attachments.len());
    println!();

    let scanner = MailScanner::new(
        direction,
        ManifestParser::new(config.parse_settings(direction)),
    );
    let outcome = scanner.scan(&mail);

    for attachment in &outcome.text_attachments {
        println!("   📄 {} → {}", attachment.filename, attachment.kind);
    }

    if !outcome.has_keyword() {
        println!("📭 Result: NO KEYWORD");
        return;
    }

    println!("🎯 Result: KEYWORD MATCH ({})", outcome.matched_keywords.join(","));

    let Some(records) = outcome.records.as_deref() else {
        println!("   No manifest records to report");
        return;
    };

    print_records(records, format);

    let report_name = outcome
        .report_file_name(&config.report.file_prefix)
        .unwrap_or_else(|| format!("{}manifest.csv", config.report.file_prefix));

    if let Some(draft) = outcome.reply_draft(
        config.reply.mailbox_for(direction),
        &report_name,
        config.reply.recipients_for(direction),
    ) {
        println!("✉️  Reply to: {}", draft.to.join(", "));
        println!("   Subject: {}", draft.subject);
        println!("   Attachment: {}", draft.attachment_name);
    }

    save_report(output_dir, &report_name, records);
}
