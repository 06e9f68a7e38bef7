//! Keyboards and static menu text.

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup};

use gcb_core::catalog::TierCatalog;

pub const BTN_ACCESS: &str = "🔐 Club access";
pub const BTN_CATALOG: &str = "📚 Materials";
pub const BTN_STATUS: &str = "📅 My access";
pub const BTN_HELP: &str = "🆘 Help";

pub fn main_menu() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![
        vec![KeyboardButton::new(BTN_ACCESS), KeyboardButton::new(BTN_CATALOG)],
        vec![KeyboardButton::new(BTN_STATUS), KeyboardButton::new(BTN_HELP)],
    ])
    .resize_keyboard(true)
}

/// One button per tier; callback data is `tier:{id}`.
pub fn tier_keyboard(catalog: &TierCatalog) -> InlineKeyboardMarkup {
    let rows: Vec<Vec<InlineKeyboardButton>> = catalog
        .iter()
        .map(|t| {
            vec![InlineKeyboardButton::callback(
                format!("{} — {} ₽", t.title, t.price_minor / 100),
                format!("tier:{}", t.id),
            )]
        })
        .collect();
    InlineKeyboardMarkup::new(rows)
}

/// Single "I've paid" button; callback data is `paid:{payment_id}`.
pub fn paid_check_keyboard(payment_id: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        "✅ I've paid",
        format!("paid:{payment_id}"),
    )]])
}

pub fn catalog_keyboard(raw: &str) -> Option<InlineKeyboardMarkup> {
    let url = url::Url::parse(raw).ok()?;
    Some(InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::url("⭐ Open the catalog", url),
    ]]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_keyboard_has_one_row_per_tier() {
        let kb = tier_keyboard(&TierCatalog::standard());
        assert_eq!(kb.inline_keyboard.len(), 3);
        let data = kb.inline_keyboard[0][0].kind.clone();
        match data {
            teloxide::types::InlineKeyboardButtonKind::CallbackData(d) => {
                assert_eq!(d, "tier:1_month");
            }
            other => panic!("unexpected button kind: {other:?}"),
        }
    }
}
