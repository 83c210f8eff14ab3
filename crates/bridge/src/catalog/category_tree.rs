//! Category tree builder.
//!
//! Turns a flat list of categories into a forest. Each category appears
//! exactly once. Categories whose parent is absent from the list (or that are
//! their own parent) become roots, as do categories trapped in a parent cycle.
//! Siblings are ordered by descending order hint; ties keep input order.

use std::collections::{HashMap, VecDeque};

use crate::models::Category;

/// Build a forest from a flat category list.
///
/// Every returned node has `sub_categories` set (empty for leaves).
pub fn build(categories: Vec<Category>) -> Vec<Category> {
    let count = categories.len();

    let mut index: HashMap<&str, usize> = HashMap::with_capacity(count);
    for (i, category) in categories.iter().enumerate() {
        index.entry(category.category_id.as_str()).or_insert(i);
    }

    let mut links: Vec<Vec<usize>> = vec![Vec::new(); count];
    let mut roots = Vec::new();
    for (i, category) in categories.iter().enumerate() {
        let parent = category
            .parent_id
            .as_deref()
            .filter(|p| *p != category.category_id)
            .and_then(|p| index.get(p).copied());
        match parent {
            Some(p) => links[p].push(i),
            None => roots.push(i),
        }
    }
    drop(index);

    // Walk from the roots; anything not reached sits on a cycle and is
    // promoted in input order.
    let mut visited = vec![false; count];
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); count];
    let mut forest = Vec::new();

    for root in roots {
        walk(root, &links, &mut visited, &mut children);
        forest.push(root);
    }
    for i in 0..count {
        if !visited[i] {
            tracing::debug!(category = %categories[i].category_id, "category parent cycle broken");
            walk(i, &links, &mut visited, &mut children);
            forest.push(i);
        }
    }

    let weights: Vec<f64> = categories.iter().map(Category::order_weight).collect();
    let by_weight = |a: &usize, b: &usize| weights[*b].total_cmp(&weights[*a]);
    forest.sort_by(by_weight);
    for siblings in &mut children {
        siblings.sort_by(by_weight);
    }

    let mut slots: Vec<Option<Category>> = categories.into_iter().map(Some).collect();
    forest
        .into_iter()
        .filter_map(|root| assemble(root, &children, &mut slots))
        .collect()
}

/// Breadth-first walk recording the tree edges of first visits.
fn walk(start: usize, links: &[Vec<usize>], visited: &mut [bool], children: &mut [Vec<usize>]) {
    visited[start] = true;
    let mut queue = VecDeque::from([start]);

    while let Some(node) = queue.pop_front() {
        for &child in &links[node] {
            if !visited[child] {
                visited[child] = true;
                children[node].push(child);
                queue.push_back(child);
            }
        }
    }
}

fn assemble(
    node: usize,
    children: &[Vec<usize>],
    slots: &mut [Option<Category>],
) -> Option<Category> {
    let mut category = slots[node].take()?;
    let subs = children[node]
        .iter()
        .filter_map(|&child| assemble(child, children, slots))
        .collect();
    category.sub_categories = Some(subs);
    Some(category)
}
