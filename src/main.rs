use mimalloc::MiMalloc;
use render::{Engine, Props, RenderError, RenderTree, TemplateResult, Value, html};
use std::cell::Cell;
use std::rc::Rc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

struct Todo {
    title: &'static str,
    done: bool,
}

fn todo_item(props: &Props) -> TemplateResult {
    let done = props.get("done").is_some_and(Value::is_truthy);
    html!(
        "<li class=\"todo\"><input type=\"checkbox\" checked=" {done} "><span>"
        {props.text("title")}
        "</span><slot name=\"extra\"></slot></li>"
    )
}

fn todo_list(todos: &[Todo], clicks: &Rc<Cell<u32>>) -> TemplateResult {
    let items: Vec<TemplateResult> = todos
        .iter()
        .map(|todo| {
            html!("<todo-item title=" {todo.title} " done=" {todo.done} "></todo-item>")
        })
        .collect();
    let clicks = Rc::clone(clicks);
    let onclick = Value::handler(move |_| clicks.set(clicks.get() + 1));
    html!("<h1>Todos (" {todos.len()} ")</h1><ul>" {items} "</ul><button onclick=" {onclick} ">clear</button>")
}

fn main() -> Result<(), RenderError> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let engine = Rc::new(Engine::new());
    engine.define("todo-item", todo_item);

    let mut tree = RenderTree::new(Rc::clone(&engine));
    let body = tree.document_mut().create_element("body");
    let clicks = Rc::new(Cell::new(0));

    let mut todos = vec![
        Todo { title: "write parser", done: true },
        Todo { title: "bind instances", done: false },
    ];
    tree.render(todo_list(&todos, &clicks), body)?;
    println!("{}", tree.document().inner_html(body));

    todos[1].done = true;
    todos.push(Todo { title: "ship it", done: false });
    tree.render(todo_list(&todos, &clicks), body)?;
    println!("{}", tree.document().inner_html(body));

    if let Some(button) = dom::find_element(tree.document(), body, "button") {
        tree.document().dispatch(button, "click");
    }
    log::info!(
        "{} templates compiled, {} click(s) handled",
        engine.templates().len(),
        clicks.get()
    );
    Ok(())
}
