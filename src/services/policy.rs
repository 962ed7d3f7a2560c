use crate::auth::Principal;
use crate::errors::AppError;
use crate::models::{Appointment, Role};

/// What a caller is trying to do to an appointment. Every state-machine
/// transition and payment operation funnels through [`authorize`]; no
/// handler re-checks roles or ownership on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    View,
    Transition,
    Cancel,
    Pay,
    Review,
}

pub fn authorize(
    principal: &Principal,
    appointment: &Appointment,
    action: Action,
) -> Result<(), AppError> {
    let is_customer_owner =
        principal.role == Role::Customer && appointment.customer_id == principal.user_id;
    let is_barber_owner =
        principal.role == Role::Barber && appointment.barber_id == principal.user_id;

    let allowed = match action {
        Action::View => is_customer_owner || is_barber_owner || principal.is_admin(),
        Action::Transition => is_barber_owner,
        Action::Cancel | Action::Pay | Action::Review => is_customer_owner,
    };

    if allowed {
        Ok(())
    } else {
        Err(AppError::Forbidden(forbidden_message(action).to_string()))
    }
}

fn forbidden_message(action: Action) -> &'static str {
    match action {
        Action::View => "Not authorized to view this appointment",
        Action::Transition => "Not authorized to update this appointment",
        Action::Cancel => "Not authorized to cancel this appointment",
        Action::Pay => "Not authorized to pay for this appointment",
        Action::Review => "Not authorized to review this appointment",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::make_appointment;

    fn principal(user_id: &str, role: Role) -> Principal {
        Principal {
            user_id: user_id.to_string(),
            role,
        }
    }

    #[test]
    fn test_owning_customer_capabilities() {
        let appointment = make_appointment("cust-1", "barber-1", "profile-1");
        let customer = principal("cust-1", Role::Customer);

        assert!(authorize(&customer, &appointment, Action::View).is_ok());
        assert!(authorize(&customer, &appointment, Action::Cancel).is_ok());
        assert!(authorize(&customer, &appointment, Action::Pay).is_ok());
        assert!(authorize(&customer, &appointment, Action::Review).is_ok());
        assert!(authorize(&customer, &appointment, Action::Transition).is_err());
    }

    #[test]
    fn test_owning_barber_capabilities() {
        let appointment = make_appointment("cust-1", "barber-1", "profile-1");
        let barber = principal("barber-1", Role::Barber);

        assert!(authorize(&barber, &appointment, Action::View).is_ok());
        assert!(authorize(&barber, &appointment, Action::Transition).is_ok());
        assert!(authorize(&barber, &appointment, Action::Cancel).is_err());
        assert!(authorize(&barber, &appointment, Action::Pay).is_err());
        assert!(authorize(&barber, &appointment, Action::Review).is_err());
    }

    #[test]
    fn test_strangers_rejected() {
        let appointment = make_appointment("cust-1", "barber-1", "profile-1");

        let other_customer = principal("cust-2", Role::Customer);
        let other_barber = principal("barber-2", Role::Barber);

        for action in [Action::View, Action::Transition, Action::Cancel, Action::Pay] {
            assert!(authorize(&other_customer, &appointment, action).is_err());
            assert!(authorize(&other_barber, &appointment, action).is_err());
        }
    }

    #[test]
    fn test_role_must_match_ownership_side() {
        let appointment = make_appointment("same-id", "same-id", "profile-1");

        // A barber principal never gets customer capabilities even when
        // the ids happen to collide.
        let barber = principal("same-id", Role::Barber);
        assert!(authorize(&barber, &appointment, Action::Cancel).is_err());
        assert!(authorize(&barber, &appointment, Action::Transition).is_ok());
    }

    #[test]
    fn test_admin_can_only_view() {
        let appointment = make_appointment("cust-1", "barber-1", "profile-1");
        let admin = principal("admin-1", Role::Admin);

        assert!(authorize(&admin, &appointment, Action::View).is_ok());
        assert!(authorize(&admin, &appointment, Action::Transition).is_err());
        assert!(authorize(&admin, &appointment, Action::Cancel).is_err());
        assert!(authorize(&admin, &appointment, Action::Pay).is_err());
    }
}
