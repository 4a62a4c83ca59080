use clap::{command, Arg, ArgAction, Command};
use std::path::PathBuf;

mod frontmatter;
mod index;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let matches = command!()
        .subcommand_required(true)
        .subcommand(
            Command::new("fix-frontmatter")
                .about("Rewrite `published` flags in frontmatter into Hugo-style `draft` flags")
                .arg(
                    Arg::new("content_dir")
                        .help("Directories whose .md files will be rewritten (non-recursive)")
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Append)
                        .default_values(["content/news", "content/messages", "content/faq"]),
                ),
        )
        .subcommand(
            Command::new("rebuild-index")
                .about("Regenerate the JSON listing file of every content subdirectory")
                .arg(
                    Arg::new("content_root")
                        .help("Root directory of the content tree")
                        .value_parser(clap::value_parser!(PathBuf))
                        .default_value("content"),
                ),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("fix-frontmatter", sub)) => {
            let dirs: Vec<PathBuf> = sub
                .get_many::<PathBuf>("content_dir")
                .unwrap()
                .cloned()
                .collect();
            let fixed = frontmatter::migrate_dirs(&dirs);
            println!("fixed {fixed} files");
        }
        Some(("rebuild-index", sub)) => {
            let content_root: &PathBuf = sub.get_one("content_root").unwrap();
            index::rebuild_all(content_root)?;
        }
        _ => unreachable!(),
    }

    Ok(())
}
