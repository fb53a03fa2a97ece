//! Keyboard construction for the bot's menus.
//!
//! Reply keyboards drive the top-level navigation (one layout per role),
//! inline keyboards drive the order directory and editor. All inline
//! buttons carry typed [`CallbackAction`]s; nothing here emits raw payload
//! strings.

use intake_types::{
	truncate_label, CallbackAction, InlineButton, InlineKeyboard, OrderId, OrderStatus,
	OrderSummary, ReplyKeyboard,
};

/// Main-menu button labels. Pressing a reply-keyboard button sends its
/// label back as a plain message, so routing matches on these exact strings.
pub const BTN_NEW_ORDER: &str = "New order";
pub const BTN_ORDERS: &str = "Orders";
pub const BTN_ORDER_STAGE: &str = "Order stage";
pub const BTN_RESET: &str = "Reset orders";

/// Maximum characters of a description shown on a directory button.
pub const LIST_LABEL_MAX: usize = 20;

/// Due-date shortcuts offered by the edit menu, in days from today.
pub const DUE_SHORTCUT_DAYS: [u32; 4] = [3, 7, 10, 15];

/// Main menu for a private chat. The reset button is admin-only.
pub fn main_menu(is_admin: bool) -> ReplyKeyboard {
	let mut rows = vec![vec![BTN_NEW_ORDER, BTN_ORDERS], vec![BTN_ORDER_STAGE]];
	if is_admin {
		rows.push(vec![BTN_RESET]);
	}
	ReplyKeyboard::new(rows)
}

/// Main menu for a group chat: browsing only.
pub fn group_menu() -> ReplyKeyboard {
	ReplyKeyboard::new(vec![vec![BTN_ORDERS]])
}

/// Directory listing mode, matching the two entry buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMode {
	/// Entries open the read-only detail view.
	View,
	/// Entries open the edit menu.
	Edit,
}

/// One button per active order, newest first, labelled `#id — description`.
pub fn order_list(summaries: &[OrderSummary], mode: ListMode) -> InlineKeyboard {
	let mut keyboard = InlineKeyboard::new();
	for summary in summaries {
		let label = format!(
			"#{} — {}",
			summary.id,
			truncate_label(&summary.description, LIST_LABEL_MAX)
		);
		let action = match mode {
			ListMode::View => CallbackAction::ViewOrder(summary.id),
			ListMode::Edit => CallbackAction::EditOrder(summary.id),
		};
		keyboard = keyboard.row(vec![InlineButton::new(label, action)]);
	}
	keyboard
}

/// Edit menu: status row, due-date shortcut row, delete row.
pub fn edit_menu(id: OrderId) -> InlineKeyboard {
	let status_row = OrderStatus::menu_choices()
		.into_iter()
		.map(|status| InlineButton::new(status.to_string(), CallbackAction::SetStatus(id, status)))
		.collect();

	let due_row = DUE_SHORTCUT_DAYS
		.into_iter()
		.map(|days| InlineButton::new(format!("+{} days", days), CallbackAction::SetDue(id, days)))
		.collect();

	InlineKeyboard::new()
		.row(status_row)
		.row(due_row)
		.row(vec![InlineButton::new(
			"Delete order",
			CallbackAction::DeleteConfirm(id),
		)])
}

/// Two-step delete confirmation.
pub fn delete_confirm(id: OrderId) -> InlineKeyboard {
	InlineKeyboard::new().row(vec![
		InlineButton::new("Yes, delete", CallbackAction::DeleteExecute(id)),
		InlineButton::new("No, keep it", CallbackAction::EditOrder(id)),
	])
}

/// Two-step reset confirmation.
pub fn reset_confirm() -> InlineKeyboard {
	InlineKeyboard::new().row(vec![
		InlineButton::new("Yes, wipe everything", CallbackAction::ResetConfirm),
		InlineButton::new("Cancel", CallbackAction::ResetCancel),
	])
}
