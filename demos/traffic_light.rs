//! Traffic Light Demo - Branches render once, values flow through readers
//!
//! Cycles a light through its states. Each state renders a colored line the
//! first time it is reached; afterwards only the "seconds left" reader
//! updates, and revisiting a state reuses the line rendered earlier.
//!
//! Run with: RUST_LOG=spark_match=debug cargo run --example traffic_light

use std::cell::RefCell;
use std::io::{self, stdout, Write};
use std::rc::Rc;

use crossterm::execute;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use spark_match::{match_value, GuardBuilder, MatchProps, PropValue, Reader};
use spark_signals::{effect, signal};
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, PartialEq)]
enum Light {
    Red(u8),
    Amber,
    Green(u8),
}

/// One rendered branch: a colored line that redraws when its reader changes.
struct Lamp {
    name: &'static str,
    lines: Rc<RefCell<Vec<String>>>,
}

type Node = Rc<Lamp>;

fn lamp(name: &'static str, color: Color, get: Reader<Light>) -> Node {
    let lines = Rc::new(RefCell::new(Vec::new()));
    let lines_for_effect = lines.clone();

    let _effect = effect(move || {
        let line = match get() {
            Light::Red(secs) | Light::Green(secs) => format!("{name}: {secs}s left"),
            Light::Amber => format!("{name}: get ready"),
        };
        let _ = execute!(
            stdout(),
            SetForegroundColor(color),
            Print(format!("  {line}\n")),
            ResetColor
        );
        lines_for_effect.borrow_mut().push(line);
    });

    Rc::new(Lamp { name, lines })
}

fn main() -> io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== spark-match Traffic Light ===\n");

    let light = signal(Light::Red(3));

    let view = match_value(
        MatchProps::new(
            PropValue::Signal(light.clone()),
            |m: GuardBuilder<Light, Node>| {
                m.when(|l: &Light| matches!(l, Light::Red(_)), |get| lamp("RED", Color::Red, get))
                    .with(Light::Amber, |get| lamp("AMBER", Color::Yellow, get))
                    .when(|l: &Light| matches!(l, Light::Green(_)), |get| {
                        lamp("GREEN", Color::Green, get)
                    })
                    .exhaustive()
            },
        )
        .label("traffic-light"),
    );

    let sequence = [
        Light::Red(2),
        Light::Red(1),
        Light::Green(3),
        Light::Green(2),
        Light::Green(1),
        Light::Amber,
        Light::Red(3),
    ];

    for state in sequence {
        light.set(state);
    }

    println!();
    match view.get() {
        Ok(node) => println!("Showing {} ({} updates)", node.name, node.lines.borrow().len()),
        Err(error) => println!("No lamp: {error}"),
    }
    println!("Branches rendered: {}", view.branch_count());
    stdout().flush()?;

    view.dispose();
    Ok(())
}
