use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use stagehand_core::{
    prop_map, BoxError, Change, Child, Component, ComponentType, Context, Element, FlushReport,
    HeadlessBackend, NodeSnapshot, Output, PrimitiveKind, PropValue, ReconcileResult,
    ReconcilerConfig, Renderer, Stats,
};
use std::path::Path;

#[derive(Debug, Args)]
pub struct DemoArgs {
    /// Number of state mutations to apply before flushing
    #[arg(short, long, default_value = "5")]
    pub steps: usize,

    /// Coalesce same-turn updates (overrides the config file)
    #[arg(short, long)]
    pub coalesce: bool,

    /// Print the JSON tree snapshot instead of backend markup
    #[arg(long)]
    pub json: bool,
}

/// Outcome of one demo run
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoRun {
    #[serde(skip)]
    pub markup: String,
    pub snapshot: Option<NodeSnapshot>,
    pub report: FlushReport,
    pub stats: Stats,
}

/// A single todo entry. Skips re-rendering when its props compare equal.
#[derive(Default)]
struct Row;

impl Component for Row {
    fn render(&self, cx: &Context) -> Result<Output, BoxError> {
        let text = cx.props().get("text").cloned().unwrap_or(PropValue::Null);
        let done = cx.props().get("done").is_some_and(|v| v.is_truthy());

        Ok(Element::builder(PrimitiveKind::Text)
            .prop("text", text)
            .prop("done", done)
            .build()?
            .into())
    }

    fn should_rerender(&self, change: &Change<'_>) -> bool {
        change.prev_props != change.next_props || change.state_changed()
    }
}

/// Keyed list of rows, newest first, under a header
struct Board {
    row: ComponentType,
}

impl Component for Board {
    fn render(&self, cx: &Context) -> Result<Output, BoxError> {
        let items = cx
            .state()
            .get("items")
            .and_then(|v| v.as_list())
            .unwrap_or_default();

        let rows = items
            .iter()
            .filter_map(|item| item.as_map())
            .map(|item| {
                let id = item.get("id").and_then(|v| v.as_int()).unwrap_or_default();
                let mut row = Element::builder(&self.row).key(id);
                if let Some(text) = item.get("text") {
                    row = row.prop("text", text.clone());
                }
                if let Some(done) = item.get("done") {
                    row = row.prop("done", done.clone());
                }
                row.build()
            })
            .collect::<Result<Vec<_>, _>>()?;

        let open = items
            .iter()
            .filter_map(|item| item.as_map())
            .filter(|item| !item.get("done").is_some_and(|v| v.is_truthy()))
            .count();
        let header = Element::builder(PrimitiveKind::Text)
            .prop("text", format!("{} open", open))
            .build()?;

        Ok(Element::builder(PrimitiveKind::Container)
            .prop("name", "board")
            .child(header)
            .child(Child::Group(rows))
            .build()?
            .into())
    }
}

fn board_type() -> ComponentType {
    let row = ComponentType::of::<Row>("Row");
    ComponentType::new("Board", move |_, _| Board { row: row.clone() })
}

/// Step `n` prepends a new item, marks every other step's item done and
/// drops the oldest item on every third step.
fn mutate(items: &[PropValue], n: usize) -> Vec<PropValue> {
    let entry = PropValue::Map(prop_map([
        ("id", PropValue::from(n)),
        ("text", PropValue::from(format!("task {}", n))),
        ("done", PropValue::from(n % 2 == 0)),
    ]));

    let mut next = Vec::with_capacity(items.len() + 1);
    next.push(entry);
    next.extend(items.iter().cloned());
    if n % 3 == 0 {
        next.pop();
    }
    next
}

fn engine<T>(result: ReconcileResult<T>) -> Result<T> {
    result.map_err(|err| anyhow!("{}", err))
}

/// Mount the board, apply `steps` mutations and flush once
pub fn run_scene(steps: usize, config: ReconcilerConfig) -> Result<DemoRun> {
    let backend = HeadlessBackend::new();
    let mut renderer = Renderer::with_config(backend.meta(), config);

    let element = engine(Element::builder(&board_type()).build())?;
    let root = engine(renderer.render_root(&element))?;
    let handle = renderer
        .handle(root)
        .ok_or_else(|| anyhow!("Board did not mount as a component"))?;

    for n in 1..=steps {
        let items: Vec<PropValue> = handle
            .state()
            .and_then(|state| state.get("items").and_then(|v| v.as_list()).map(|l| l.to_vec()))
            .unwrap_or_default();
        handle.set_state(prop_map([("items", PropValue::List(mutate(&items, n)))]));
    }

    let report = engine(renderer.flush())?;

    Ok(DemoRun {
        markup: backend.markup(),
        snapshot: renderer.snapshot(root),
        report,
        stats: renderer.stats(),
    })
}

pub fn demo(args: DemoArgs, cwd: &Path) -> Result<()> {
    let mut config = ReconcilerConfig::load(cwd)?;
    if args.coalesce {
        config = config.with_coalescing(true);
    }

    let run = run_scene(args.steps, config)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&run)?);
        return Ok(());
    }

    println!("{}", "🎬 Stagehand demo".bright_blue().bold());
    println!();
    print!("{}", run.markup);
    println!();
    println!(
        "  {} {} turns, {} passes, {} callbacks, {} dropped",
        "✓".green(),
        run.report.turns,
        run.report.passes,
        run.report.callbacks,
        run.report.dropped
    );
    println!(
        "  {} {} built, {} mounted, {} unmounted",
        "✓".green(),
        run.stats.built,
        run.stats.mounted,
        run.stats.unmounted
    );

    Ok(())
}
