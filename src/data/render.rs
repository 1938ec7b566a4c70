use std::collections::{HashSet, VecDeque};

use dot_writer::Attributes;
use dot_writer::DotWriter;

use crate::data::{Kind, Object, Pair, Ptr};

fn node_for_ptr(p: Ptr) -> String {
    format!(r#"<{p}>"#)
}

/// Render the tree under `root` as a Graphviz graph.
///
/// Cells show their head, tail, and tag as ports; `nil` links are drawn in
/// place rather than as edges.
pub fn render_tree(root: Ptr) -> Vec<u8> {
    let mut outbuf = Vec::new();
    {
        let mut writer = DotWriter::from(&mut outbuf);
        let mut graph = writer.digraph();
        graph.node_attributes().set_font("monospace");
        let mut queue = VecDeque::new();
        let mut seen = HashSet::new();
        queue.push_back(root);

        while let Some(it) = queue.pop_front() {
            if it.is_nil() || !seen.insert(it) {
                continue;
            }

            let id = node_for_ptr(it);
            let mut node = graph.node_named(&id);
            node.set_shape(dot_writer::Shape::None);
            let name = format!("{it}");

            let value = match it.get() {
                Object::Nil => continue,
                Object::Pair(Pair { head, tail, tag }) => {
                    let label = format!(
                        "<{}>",
                        maud::html!(
                            table cellspacing="0" {
                                tr { td colspan="3" border="0" { (name) } }
                                tr {
                                    td port="head" { (head) }
                                    td port="tail" { (tail) }
                                    td port="tag" { (tag) }
                                }
                            }
                        )
                        .into_string()
                    );
                    node.set_html(&label);
                    let ports = [
                        (head, node.id().port("head")),
                        (tail, node.id().port("tail")),
                        (tag, node.id().port("tag")),
                    ];
                    std::mem::drop(node);
                    for (target, port) in ports {
                        if !target.is_nil() {
                            queue.push_back(target);
                            graph.edge(port, node_for_ptr(target));
                        }
                    }
                    continue;
                }
                Object::Symbol(_) if it.is_missing_arg() => "<missing>".to_owned(),
                Object::Symbol(s) => s.name(),
                Object::Vector(v) if matches!(v.kind(), Kind::String | Kind::Vector | Kind::Expression) => {
                    let elements: Vec<Ptr> = (0..v.len()).filter_map(|i| v.element(i)).collect();
                    let label = format!(
                        "<{}>",
                        maud::html!(
                            table cellspacing="0" {
                                tr { td colspan=(elements.len().max(1)) border="0" { (name) } }
                                tr {
                                    @for (i, e) in elements.iter().enumerate() {
                                        td port=(format!("e{i}")) { (e) }
                                    }
                                }
                            }
                        )
                        .into_string()
                    );
                    node.set_html(&label);
                    let ports: Vec<_> = elements
                        .iter()
                        .enumerate()
                        .map(|(i, e)| (*e, node.id().port(&format!("e{i}"))))
                        .collect();
                    std::mem::drop(node);
                    for (target, port) in ports {
                        queue.push_back(target);
                        graph.edge(port, node_for_ptr(target));
                    }
                    continue;
                }
                _ => it.sexpr().to_string(),
            };
            let label = format!(
                "<{}>",
                maud::html!(
                    table cellspacing="0" {
                        tr { td border="0" { (name) } }
                        tr { td { (value) } }
                    }
                )
                .into_string()
            );
            node.set_html(&label);
        }
    }
    outbuf
}

#[cfg(test)]
mod tests {
    use crate::data::Storage;

    #[test]
    fn renders_cells_and_atoms() {
        let store = Storage::default();
        let call = store.lang(
            store.make_symbol("f"),
            store.list([store.scalar_real(1.0), store.missing_arg()]),
        );
        let out = String::from_utf8(super::render_tree(call)).unwrap();
        assert!(out.starts_with("digraph"));
        assert!(out.contains("<lang#"));
        assert!(out.contains("&lt;missing&gt;"));
        assert!(out.contains(":head -> "));
    }
}
