//! Status derivation for the order tree.
//!
//! Step and order statuses are never set directly: they are recomputed from
//! the level below after every change. Only `Payed` and `Canceled` are
//! assigned explicitly, and both are terminal.

use crate::entities::sea_orm_active_enums::{
    MenuServiceKind, OrderStatus, StepMenuStatus, StepStatus,
};

/// Status a freshly added menu line starts in. Direct-service menus have
/// nothing to prepare, so they are born ready.
pub fn initial_step_menu_status(service_kind: MenuServiceKind) -> StepMenuStatus {
    match service_kind {
        MenuServiceKind::Prep => StepMenuStatus::InPrep,
        MenuServiceKind::Direct => StepMenuStatus::Ready,
    }
}

/// Derives a step's status from its menu lines.
pub fn derive_step_status(lines: &[StepMenuStatus]) -> StepStatus {
    if lines.is_empty() {
        return StepStatus::InPrep;
    }
    if lines.iter().all(|s| *s == StepMenuStatus::Served) {
        return StepStatus::Served;
    }
    if lines
        .iter()
        .all(|s| matches!(s, StepMenuStatus::Ready | StepMenuStatus::Served))
    {
        return StepStatus::Ready;
    }
    StepStatus::InPrep
}

/// Derives an order's status from its steps. Terminal statuses are sticky.
pub fn derive_order_status(current: OrderStatus, steps: &[StepStatus]) -> OrderStatus {
    if matches!(current, OrderStatus::Payed | OrderStatus::Canceled) {
        return current;
    }
    if !steps.is_empty() && steps.iter().all(|s| *s == StepStatus::Served) {
        OrderStatus::Served
    } else {
        OrderStatus::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_menus_start_ready_prep_menus_start_in_prep() {
        assert_eq!(
            initial_step_menu_status(MenuServiceKind::Direct),
            StepMenuStatus::Ready
        );
        assert_eq!(
            initial_step_menu_status(MenuServiceKind::Prep),
            StepMenuStatus::InPrep
        );
    }

    #[test]
    fn empty_step_is_in_prep() {
        assert_eq!(derive_step_status(&[]), StepStatus::InPrep);
    }

    #[test]
    fn step_is_served_only_when_every_line_is_served() {
        assert_eq!(
            derive_step_status(&[StepMenuStatus::Served, StepMenuStatus::Served]),
            StepStatus::Served
        );
        assert_eq!(
            derive_step_status(&[StepMenuStatus::Served, StepMenuStatus::Ready]),
            StepStatus::Ready
        );
    }

    #[test]
    fn step_is_ready_when_lines_are_ready_or_served() {
        assert_eq!(
            derive_step_status(&[StepMenuStatus::Ready, StepMenuStatus::Ready]),
            StepStatus::Ready
        );
        assert_eq!(
            derive_step_status(&[StepMenuStatus::Ready, StepMenuStatus::Served]),
            StepStatus::Ready
        );
    }

    #[test]
    fn one_line_in_prep_keeps_the_step_in_prep() {
        assert_eq!(
            derive_step_status(&[
                StepMenuStatus::Served,
                StepMenuStatus::Ready,
                StepMenuStatus::InPrep
            ]),
            StepStatus::InPrep
        );
    }

    #[test]
    fn order_is_served_when_all_steps_are_served() {
        assert_eq!(
            derive_order_status(
                OrderStatus::Pending,
                &[StepStatus::Served, StepStatus::Served]
            ),
            OrderStatus::Served
        );
    }

    #[test]
    fn order_without_steps_stays_pending() {
        assert_eq!(
            derive_order_status(OrderStatus::Pending, &[]),
            OrderStatus::Pending
        );
    }

    #[test]
    fn order_leaves_served_when_a_step_regresses() {
        assert_eq!(
            derive_order_status(
                OrderStatus::Served,
                &[StepStatus::Served, StepStatus::InPrep]
            ),
            OrderStatus::Pending
        );
    }

    #[test]
    fn terminal_statuses_are_sticky() {
        assert_eq!(
            derive_order_status(OrderStatus::Payed, &[StepStatus::InPrep]),
            OrderStatus::Payed
        );
        assert_eq!(
            derive_order_status(OrderStatus::Canceled, &[StepStatus::Served]),
            OrderStatus::Canceled
        );
    }
}
