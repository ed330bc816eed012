//! Command dispatch and handlers

use std::io;
use std::path::Path;

use clap::CommandFactory;
use clap_complete::generate;
use termtree::Tree;
use tracing::{debug, instrument};

use crate::application::services::BuildReport;
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{ClickOutcome, Node, NodeId, NodeState, Renderer};
use crate::infrastructure::di::ServiceContainer;

/// Execute the CLI command.
pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        Some(Commands::Config { command }) => cmd_config(command, cli.config.as_deref()),
        Some(command) => {
            let settings = Settings::load(cli.config.as_deref())?;
            let container = ServiceContainer::new(settings);
            match command {
                Commands::Build {
                    input,
                    json,
                    html,
                    no_json,
                    no_html,
                } => {
                    let json = (!no_json).then(|| {
                        json.clone()
                            .unwrap_or_else(|| container.hierarchy.default_output_path(input, "json"))
                    });
                    let html = (!no_html).then(|| {
                        html.clone()
                            .unwrap_or_else(|| container.hierarchy.default_output_path(input, "html"))
                    });
                    cmd_build(&container, input, json.as_deref(), html.as_deref())
                }
                Commands::Check { input } => cmd_check(&container, input),
                Commands::Tree { input } => cmd_tree(&container, input),
                Commands::Outline { input, toggles } => cmd_outline(&container, input, toggles),
                Commands::Config { .. } | Commands::Completion { .. } => Ok(()),
            }
        }
        None => Err(CliError::Usage(
            "no command given, see --help".to_string(),
        )),
    }
}

fn report_warnings(report: &BuildReport) {
    for warning in report.warnings() {
        output::warning(&warning);
    }
}

#[instrument(level = "debug", skip(container))]
fn cmd_build(
    container: &ServiceContainer,
    input: &Path,
    json: Option<&Path>,
    html: Option<&Path>,
) -> CliResult<()> {
    if json.is_none() && html.is_none() {
        return Err(CliError::InvalidArgs(
            "--no-json and --no-html leave nothing to write".to_string(),
        ));
    }
    let report = container.hierarchy.build(input)?;
    report_warnings(&report);

    let artifacts = container
        .hierarchy
        .write_artifacts(&report.tree, json, html)?;
    if let Some(path) = &artifacts.json {
        output::action("JSON", &path.display());
    }
    if let Some(path) = &artifacts.html {
        output::action("HTML", &path.display());
    }
    output::success(&format!(
        "{} rows, {} resources",
        report.rows,
        report.tree.resources().len()
    ));
    Ok(())
}

fn cmd_check(container: &ServiceContainer, input: &Path) -> CliResult<()> {
    let rows = container.hierarchy.load_rows(input)?;
    let summary = container.hierarchy.summarize(&rows);
    let report = container.hierarchy.analyze(&rows)?;

    output::header(&format!("{} ({} rows)", input.display(), rows.len()));
    for (label, values) in [
        ("parents", &summary.parents),
        ("children", &summary.children),
        ("subchildren", &summary.subchildren),
    ] {
        output::info(&format!("{label}: {} unique", values.len()));
        for (name, count) in values {
            output::detail(&format!("{count:>5}  {name}"));
        }
    }

    if report.is_clean() {
        output::success("no findings");
    } else {
        report_warnings(&report);
    }
    Ok(())
}

fn cmd_tree(container: &ServiceContainer, input: &Path) -> CliResult<()> {
    let report = container.hierarchy.build(input)?;
    report_warnings(&report);
    output::info(&to_termtree(&report.tree));
    Ok(())
}

fn to_termtree(node: &Node) -> Tree<String> {
    let label = match &node.url {
        Some(url) => format!("{} ({url})", node.name),
        None => node.name.clone(),
    };
    Tree::new(label).with_leaves(node.children.iter().map(to_termtree))
}

fn cmd_outline(container: &ServiceContainer, input: &Path, toggles: &[String]) -> CliResult<()> {
    let report = container.hierarchy.build(input)?;
    report_warnings(&report);

    let mut renderer = Renderer::new(&report.tree, container.settings.to_render_config());
    renderer.draw();

    for path in toggles {
        let segments = split_node_path(path);
        let id = renderer
            .find(&segments)
            .ok_or_else(|| CliError::InvalidArgs(format!("no node at path: {path}")))?;
        match renderer.click(id) {
            ClickOutcome::Toggled { state, transition } => {
                debug!(?state, nodes = transition.nodes.len(), "toggle {path}");
            }
            ClickOutcome::OpenResource { href } => output::action("open", &href),
            ClickOutcome::Ignored => {
                output::warning(&format!("{path}: not visible or nothing to open"))
            }
        }
    }

    output::info(&outline(&renderer, renderer.root()));
    let fit = renderer.viewport().fit;
    output::detail(&format!(
        "viewBox [{:.1}, {:.1}, {:.1}, {:.1}]",
        fit.min_x, fit.min_y, fit.width, fit.height
    ));
    Ok(())
}

/// Split a toggle path on `/`. A backslash escapes the next character, so
/// `Build/CI\/CD` names the `CI/CD` node under `Build`.
fn split_node_path(path: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = path.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => current.extend(chars.next()),
            '/' => segments.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    segments.push(current);
    segments.retain(|s| !s.is_empty());
    segments
}

/// Visible part of the tree with expand markers and layout positions.
fn outline(renderer: &Renderer<'_>, id: NodeId) -> Tree<String> {
    let marker = match renderer.state(id) {
        Some(NodeState::Expanded) => "[-]",
        Some(NodeState::Collapsed) => "[+]",
        _ => " * ",
    };
    let name = renderer.node(id).map(|n| n.name.as_str()).unwrap_or("?");
    let label = match renderer.frame().position(id) {
        Some(p) => format!("{marker} {name} @ ({:.0}, {:.0})", p.x, p.y),
        None => format!("{marker} {name}"),
    };
    let leaves = renderer
        .children(id)
        .iter()
        .copied()
        .filter(|&c| renderer.is_visible(c))
        .map(|c| outline(renderer, c));
    Tree::new(label).with_leaves(leaves)
}

fn cmd_config(command: &ConfigCommands, local: Option<&Path>) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = Settings::load(local)?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Template => output::info(&Settings::template()),
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => {
                    let status = if path.exists() { "exists" } else { "not found" };
                    output::action("global", &format!("{} ({status})", path.display()));
                }
                None => output::action("global", &"no config directory"),
            }
            let path = local.map(Path::to_path_buf).unwrap_or_else(local_config_path);
            let status = if path.exists() { "exists" } else { "not found" };
            output::action("local", &format!("{} ({status})", path.display()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ResourceUrl;

    #[test]
    fn given_tree_when_rendering_termtree_then_shows_urls() {
        let mut root = Node::category("Start Here");
        let mut a = Node::category("A");
        a.children
            .push(Node::resource("R1", None, ResourceUrl::Domain("x.org".into())));
        root.children.push(a);

        let text = to_termtree(&root).to_string();

        assert!(text.starts_with("Start Here\n"));
        assert!(text.contains("R1 (x.org)"));
    }

    #[test]
    fn given_escaped_slash_when_splitting_path_then_kept_in_segment() {
        assert_eq!(split_node_path("Build/CI\\/CD/"), vec!["Build", "CI/CD"]);
        assert_eq!(split_node_path("/A//B"), vec!["A", "B"]);
        assert_eq!(split_node_path("a\\\\b"), vec!["a\\b"]);
    }

    #[test]
    fn given_category_with_slash_when_toggled_by_escaped_path_then_expands() {
        let mut root = Node::category("Start Here");
        let mut ci = Node::category("CI/CD");
        ci.children
            .push(Node::resource("Runner", None, ResourceUrl::Unavailable));
        root.children.push(ci);
        let mut renderer = Renderer::new(&root, Default::default());
        renderer.draw();

        let id = renderer.find(&split_node_path("CI\\/CD")).unwrap();

        assert!(matches!(
            renderer.click(id),
            ClickOutcome::Toggled {
                state: NodeState::Expanded,
                ..
            }
        ));
    }

    #[test]
    fn given_collapsed_child_when_outlining_then_only_root_level_shown() {
        let mut root = Node::category("Start Here");
        let mut a = Node::category("A");
        a.children
            .push(Node::resource("R1", None, ResourceUrl::Unavailable));
        root.children.push(a);
        let mut renderer = Renderer::new(&root, Default::default());
        renderer.draw();

        let text = outline(&renderer, renderer.root()).to_string();

        assert!(text.contains("[-] Start Here @ (0, 0)"));
        assert!(text.contains("[+] A @ (240, 0)"));
        assert!(!text.contains("R1"));
    }
}
