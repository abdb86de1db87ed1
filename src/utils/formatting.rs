use console::style;
use tabled::{
    settings::{Alignment, Style},
    Table, Tabled,
};

use crate::models::{Adjustment, HasAttributes, Item};
use crate::services::Cart;

#[derive(Tabled)]
struct ItemTableRow {
    #[tabled(rename = "Row ID")]
    row_id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Qty")]
    qty: String,
    #[tabled(rename = "Price")]
    price: String,
    #[tabled(rename = "Discount")]
    discount: String,
    #[tabled(rename = "Tax")]
    tax: String,
    #[tabled(rename = "Line Total")]
    line_total: String,
    #[tabled(rename = "Options")]
    options: String,
}

pub fn format_item_table(cart: &Cart) -> String {
    if !cart.has_items() {
        return String::new();
    }

    let rows: Vec<ItemTableRow> = cart
        .items()
        .iter()
        .map(|(row_id, item)| ItemTableRow {
            row_id: format!("{:.8}", row_id),
            name: match item.name() {
                Some(name) if name.chars().count() > 30 => {
                    format!("{}...", name.chars().take(27).collect::<String>())
                }
                Some(name) => name.to_string(),
                None => "-".to_string(),
            },
            qty: format_quantity(item.qty()),
            price: format_amount(item.price()),
            discount: format_adjustment(item.discount()),
            tax: format_adjustment(item.tax()),
            line_total: format_amount(item.calculate_price()),
            options: format_options(item),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded()).with(Alignment::left());

    table.to_string()
}

pub fn format_item_detail(item: &Item) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "{}: {}\n",
        style("Row ID").bold(),
        style(item.row_id().unwrap_or("-")).cyan()
    ));
    output.push_str(&format!(
        "{}: {}\n",
        style("Name").bold(),
        style(item.name().unwrap_or("-")).green()
    ));
    output.push_str(&format!("{}: {}\n", style("Qty").bold(), format_quantity(item.qty())));
    output.push_str(&format!("{}: {}\n", style("Price").bold(), format_amount(item.price())));

    if let Some(discount) = item.discount() {
        output.push_str(&format!("{}: {}\n", style("Discount").bold(), style(discount).yellow()));
    }

    if let Some(tax) = item.tax() {
        output.push_str(&format!("{}: {}\n", style("Tax").bold(), style(tax).yellow()));
    }

    for (key, value) in item.attributes() {
        if matches!(key.as_str(), "rowId" | "name" | "qty" | "price" | "discount" | "tax") {
            continue;
        }
        output.push_str(&format!("{}: {}\n", style(key).bold(), style(value).dim()));
    }

    if item.has_options() {
        output.push_str(&format!("{}: {}\n", style("Options").bold(), format_options(item)));
    }

    output.push_str(&format!(
        "{}: {}\n",
        style("Line Total").bold(),
        style(format_amount(item.calculate_price())).green()
    ));

    output
}

pub fn format_totals(cart: &Cart) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "{}: {}\n",
        style("Items").bold(),
        format_quantity(cart.total_qty())
    ));
    output.push_str(&format!(
        "{}: {}\n",
        style("Subtotal").bold(),
        format_amount(cart.total_price())
    ));

    if let Some(discount) = cart.discount() {
        output.push_str(&format!(
            "{}: -{}{}\n",
            style("Discount").bold(),
            format_amount(cart.calculate_percentual_or_fixed(&discount)),
            percent_note(&discount)
        ));
    }

    if let Some(tax) = cart.tax() {
        output.push_str(&format!(
            "{}: +{}{}\n",
            style("Tax").bold(),
            format_amount(cart.calculate_percentual_or_fixed(&tax)),
            percent_note(&tax)
        ));
    }

    output.push_str(&format!(
        "{}: {}\n",
        style("Total").bold(),
        style(format_amount(cart.total())).green().bold()
    ));

    output
}

pub fn format_amount(amount: f64) -> String {
    format!("{:.2}", amount)
}

/// Whole quantities print without decimals.
pub fn format_quantity(qty: f64) -> String {
    if qty.fract() == 0.0 {
        format!("{}", qty as i64)
    } else {
        format!("{}", qty)
    }
}

fn percent_note(adjustment: &Adjustment) -> String {
    if adjustment.is_percent() {
        format!(" ({})", adjustment)
    } else {
        String::new()
    }
}

fn format_adjustment(adjustment: Option<Adjustment>) -> String {
    adjustment
        .map(|adjustment| adjustment.to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn format_options(item: &Item) -> String {
    if !item.has_options() {
        return "-".to_string();
    }

    item.options()
        .iter()
        .map(|(name, option)| match option.get("value") {
            Ok(serde_json::Value::String(value)) => format!("{}={}", name, value),
            Ok(value) => format!("{}={}", name, value),
            Err(_) => name.clone(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}
