/**
 * Scoped Style CLI - scope-css
 *
 * Loads a style sheet as `<style scoped>` inside a container of the
 * in-memory document, lets it settle and prints the scoped CSS.
 */
use std::fs;
use std::path::PathBuf;
use std::process;

use anyhow::{anyhow, bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use log::warn;

use scoped_style::condition::scope_to_condition;
use scoped_style::memory::css::{parse_stylesheet, style_rule_text, ParsedRule};
use scoped_style::memory::{settle, MemoryDocument};
use scoped_style::{DocumentHost, ScopeOptions, ScopedStyles, StyleSheetHost};

const DEFAULT_MAX_TICKS: &str = "100";

fn main() {
    env_logger::init();

    let matches = command().get_matches();
    if let Err(err) = run(&matches) {
        eprintln!("Error: {:#}", err);
        process::exit(1);
    }
}

fn command() -> Command {
    Command::new("scope-css")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Scope a style sheet to the element it is attached to")
        .arg(
            Arg::new("file")
                .value_name("FILE")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("CSS file to scope"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("JSON scope options, e.g. {\"applyToClass\": true}"),
        )
        .arg(
            Arg::new("class")
                .long("class")
                .action(ArgAction::SetTrue)
                .help("Mark the scope element with a class instead of an attribute"),
        )
        .arg(
            Arg::new("prefix")
                .long("prefix")
                .value_name("PREFIX")
                .help("Naming prefix of generated markers"),
        )
        .arg(
            Arg::new("resource")
                .long("resource")
                .value_name("HREF=PATH")
                .action(ArgAction::Append)
                .help("Serve the file at PATH for imports of HREF"),
        )
        .arg(
            Arg::new("cross-origin")
                .long("cross-origin")
                .value_name("HREF")
                .action(ArgAction::Append)
                .help("Treat a served resource as coming from another origin"),
        )
        .arg(
            Arg::new("max-ticks")
                .long("max-ticks")
                .value_name("N")
                .value_parser(value_parser!(usize))
                .default_value(DEFAULT_MAX_TICKS)
                .help("Give up waiting for pending sheets after N ticks"),
        )
        .arg(
            Arg::new("strategy")
                .long("strategy")
                .value_parser(["anchor", "condition"])
                .default_value("anchor")
                .help("Rewrite with scope anchors, or append a condition to every selector"),
        )
        .arg(
            Arg::new("condition")
                .long("condition")
                .value_name("SELECTOR")
                .help("Condition used by the condition strategy"),
        )
}

fn run(matches: &ArgMatches) -> Result<()> {
    let file = matches
        .get_one::<PathBuf>("file")
        .ok_or_else(|| anyhow!("missing input file"))?;
    let css = fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;

    match matches.get_one::<String>("strategy").map(String::as_str) {
        Some("condition") => {
            let condition = matches
                .get_one::<String>("condition")
                .context("--strategy condition needs --condition")?;
            println!("{}", scope_rules_to_condition(&parse_stylesheet(&css), condition));
            Ok(())
        }
        _ => run_anchor(matches, &css),
    }
}

fn load_options(matches: &ArgMatches) -> Result<ScopeOptions> {
    let mut options = match matches.get_one::<PathBuf>("config") {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            ScopeOptions::from_json(&json).with_context(|| format!("parsing {}", path.display()))?
        }
        None => ScopeOptions::default(),
    };
    if matches.get_flag("class") {
        options.apply_to_class = true;
    }
    if let Some(prefix) = matches.get_one::<String>("prefix") {
        options.prefix = prefix.clone();
    }
    Ok(options)
}

fn serve_resources(matches: &ArgMatches, doc: &mut MemoryDocument) -> Result<()> {
    let cross_origin: Vec<&String> = matches
        .get_many::<String>("cross-origin")
        .map(|values| values.collect())
        .unwrap_or_default();

    for resource in matches.get_many::<String>("resource").into_iter().flatten() {
        let Some((href, path)) = resource.split_once('=') else {
            bail!("--resource expects HREF=PATH, got `{}`", resource);
        };
        let text = fs::read_to_string(path).with_context(|| format!("reading {}", path))?;
        if cross_origin.iter().any(|origin| origin.as_str() == href) {
            doc.serve_cross_origin(href, &text);
        } else {
            doc.serve(href, &text);
        }
    }
    Ok(())
}

fn run_anchor(matches: &ArgMatches, css: &str) -> Result<()> {
    let options = load_options(matches)?;
    let max_ticks = matches
        .get_one::<usize>("max-ticks")
        .copied()
        .ok_or_else(|| anyhow!("missing --max-ticks"))?;

    let mut doc = MemoryDocument::new();
    serve_resources(matches, &mut doc)?;

    let container = doc.create_element("div");
    let style = doc.create_style(css);
    doc.set_scoped(style, true);
    doc.append_child(container, style)?;
    let body = doc.body();
    doc.append_child(body, container)?;

    let mut scoped = ScopedStyles::new(&mut doc, options)?;
    scoped.setup(&mut doc)?;
    let ticks = settle(&mut doc, &mut scoped, max_ticks)?;
    if scoped.needs_tick() {
        warn!(
            "gave up after {} ticks, {} sheets still pending",
            ticks,
            scoped.scheduler().pending_len()
        );
    }

    let marker = scoped
        .token(style)
        .context("the style element was not scoped")?;
    println!("/* scope marker: {} */", marker);

    let sheet = doc.sheet(style).context("the style element has no sheet")?;
    for (index, sheet) in doc.sheet_chain(sheet).into_iter().enumerate() {
        if index > 0 {
            println!("/* {} */", doc.href(sheet).unwrap_or_default());
        }
        println!("{}", doc.sheet_css(sheet));
    }
    Ok(())
}

fn scope_rules_to_condition(rules: &[ParsedRule], condition: &str) -> String {
    rules
        .iter()
        .map(|rule| match rule {
            ParsedRule::Style {
                selector,
                declarations,
            } => style_rule_text(&scope_to_condition(selector, condition), declarations),
            ParsedRule::Group { prelude, rules } => format!(
                "{} {{\n{}\n}}",
                prelude,
                scope_rules_to_condition(rules, condition)
            ),
            ParsedRule::Import { prelude, .. } => format!("{};", prelude),
            ParsedRule::Other {
                prelude,
                block: Some(block),
            } => format!("{} {{ {} }}", prelude, block),
            ParsedRule::Other {
                prelude,
                block: None,
            } => format!("{};", prelude),
        })
        .collect::<Vec<_>>()
        .join("\n")
}
