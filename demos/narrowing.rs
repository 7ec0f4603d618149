//! Walks a small branch/merge function through the engine: an
//! `isinstance`-style check narrows a union on one branch, and the solver
//! rules out the combinations that cannot co-occur after the merge.
//!
//! Run with:
//! ```bash
//! cargo run --example narrowing
//! ```

use vfg_rs::vfg::Vfg;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    simplelog::TermLogger::init(
        simplelog::LevelFilter::Debug,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    // def f(x: int | None):
    //     if x is not None:
    //         y = x + 1      # x narrowed to int here
    //     else:
    //         y = 0
    //     return y
    let vfg: Vfg<&str> = Vfg::new();
    println!("vfg = {:?}", vfg);

    let entry = vfg.new_node_named("entry", &[]);
    let then_ = vfg.new_node_named("then", &[entry]);
    let else_ = vfg.new_node_named("else", &[entry]);
    let merge = vfg.new_node_named("merge", &[then_, else_]);

    let x = vfg.new_variable_named("x");
    let y = vfg.new_variable_named("y");

    let x_int = vfg.bind(x, entry, "int", &[]);
    let x_none = vfg.bind(x, entry, "None", &[]);

    // The then-branch narrows x to int; y depends on that narrowing.
    let x_narrowed = vfg.bind(x, then_, "int", &[x_int]);
    let y_int = vfg.bind(y, then_, "int", &[x_narrowed]);
    let y_zero = vfg.bind(y, else_, "int(0)", &[x_none]);

    println!("vfg = {:?}", vfg);

    for (label, binding) in [("x=int", x_int), ("x=None", x_none)] {
        for (other, b2) in [("y=int", y_int), ("y=int(0)", y_zero)] {
            let ok = vfg.has_combination(merge, &[binding, b2]);
            println!("{} with {} at merge: {}", label, other, ok);
        }
    }

    println!(
        "visible bindings of y at merge: {}",
        vfg.visible_bindings(y, merge).len()
    );
    println!("solver stats: {:?}", vfg.solver_stats());

    Ok(())
}
