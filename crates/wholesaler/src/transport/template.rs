use crate::domain::requests::{OrderData, format_cents};
use crate::model::ShippingAddress;
use askama::Template;

struct TemplateLine<'a> {
    product_name: &'a str,
    product_code: &'a str,
    quantity: i32,
    unit_price: String,
    line_total: String,
}

#[derive(Template)]
#[template(path = "wholesaler_order.html")]
struct WholesalerOrderTemplate<'a> {
    order_number: &'a str,
    order_date: &'a str,
    address: &'a ShippingAddress,
    lines: Vec<TemplateLine<'a>>,
    total: String,
    notes: Option<&'a str>,
}

pub fn render_order_email(data: &OrderData) -> Result<String, askama::Error> {
    let lines = data
        .items
        .iter()
        .map(|item| TemplateLine {
            product_name: &item.product_name,
            product_code: &item.product_code,
            quantity: item.quantity,
            unit_price: format_cents(item.price),
            line_total: format_cents(item.line_total()),
        })
        .collect();

    let total = data.items.iter().map(|item| item.line_total()).sum();

    WholesalerOrderTemplate {
        order_number: &data.order_number,
        order_date: &data.order_date,
        address: &data.shipping_address,
        lines,
        total: format_cents(total),
        notes: data.notes.as_deref().filter(|notes| !notes.trim().is_empty()),
    }
    .render()
}
