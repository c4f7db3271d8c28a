// src/core/evaluator.rs

use crate::models::{ConditionNode, MenuId, Reaction, Tags};

/// Evaluates a condition tree against a tag snapshot.
///
/// Pure and total: the node set is closed, so there is nothing left to reject here.
/// `And([])` is true and `Or([])` is false.
pub fn evaluate(node: &ConditionNode, tags: &Tags) -> bool {
    match node {
        ConditionNode::Always => true,
        ConditionNode::TagSet(name) => tags.contains_key(name),
        ConditionNode::TagUnset(name) => !tags.contains_key(name),
        ConditionNode::And(children) => children.iter().all(|c| evaluate(c, tags)),
        ConditionNode::Or(children) => children.iter().any(|c| evaluate(c, tags)),
        ConditionNode::Not(inner) => !evaluate(inner, tags),
        ConditionNode::When(inner) => evaluate(inner, tags),
    }
}

/// Resolves the concrete submenu id of a reaction.
///
/// With a postfix tag, the id is `sub_menu` followed by that tag's current value,
/// and is absent when either the tag is unset or `sub_menu` is missing. Without
/// one, `sub_menu` is used verbatim. Empty ids count as absent.
pub fn resolve_sub_menu_id(reaction: &Reaction, tags: &Tags) -> Option<MenuId> {
    let base = reaction.sub_menu.as_deref()?;
    let id = match reaction.sub_id_postfix.as_deref() {
        Some(postfix_tag) => {
            let value = tags.get(postfix_tag)?;
            format!("{}{}", base, value)
        }
        None => base.to_string(),
    };

    if id.is_empty() {
        None
    } else {
        Some(MenuId::new(id))
    }
}
