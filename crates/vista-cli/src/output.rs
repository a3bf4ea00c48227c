use serde_json::json;

use vista_domain::FieldDefinition;
use vista_views::MaterializedView;

pub fn print_view(view: &MaterializedView) {
    println!("view {} — {} items", view.view_key, view.total_items);

    if let Some(error) = &view.error {
        println!("error: {}", error);
    }
    if let Some(filter) = &view.effective_filter {
        println!("filter: {}", filter);
    }
    if let Some(sort) = &view.sort {
        println!("sort: {} {:?}", sort.field_id, sort.direction);
    }
    if let Some(slice) = &view.slice {
        match &slice.value {
            Some(value) => println!("slice: {} = {}", slice.field_id, value),
            None => println!("slice: {} has no value", slice.field_id),
        }
    }

    let columns: Vec<&str> = view.fields.iter().map(|f| f.name.as_str()).collect();
    if !columns.is_empty() {
        println!("columns: {}", columns.join(" | "));
    }

    for group in &view.groups {
        match &group.label {
            Some(label) => {
                let divisors: String = group
                    .divisors
                    .iter()
                    .map(|d| format!("  {}: {}", d.label, d.total))
                    .collect();
                println!("\n# {} ({}){}", label.name, group.items.len(), divisors);
            }
            None => println!(),
        }
        for item in &group.items {
            let title = item
                .content
                .as_ref()
                .and_then(|c| c.title.as_deref())
                .unwrap_or("(no title)");
            println!("  - [{}] {}", item.id, title);
        }
    }
}

pub fn print_view_json(view: &MaterializedView) -> anyhow::Result<()> {
    let groups: Vec<_> = view
        .groups
        .iter()
        .map(|group| {
            json!({
                "label": group.label.as_ref().map(|l| l.name.clone()),
                "unassigned": group.unassigned,
                "items": group.items.iter().map(|i| i.id.clone()).collect::<Vec<_>>(),
                "divisors": group.divisors.iter()
                    .map(|d| json!({ "label": d.label, "total": d.total }))
                    .collect::<Vec<_>>(),
            })
        })
        .collect();

    let out = json!({
        "viewKey": view.view_key,
        "error": view.error,
        "effectiveFilter": view.effective_filter,
        "sort": view.sort,
        "slice": view.slice,
        "fields": view.fields.iter().map(|f| f.id.clone()).collect::<Vec<_>>(),
        "totalItems": view.total_items,
        "groups": groups,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

pub fn print_fields(fields: &[FieldDefinition]) {
    for field in fields {
        let extent = match field.catalog() {
            Some(catalog) => format!(" ({} options)", catalog.len()),
            None => String::new(),
        };
        println!("{}  {}  {:?}{}", field.id, field.name, field.data_type, extent);
    }
}
