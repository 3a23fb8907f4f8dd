use super::{Guard, GuardContext};
use crate::config::RoutesConfig;
use crate::models::{AffiliateStatus, AuthState, BlockedAction, BlockedView, GuardDecision};

/// Gates the chat feature on an approved affiliate status.
#[derive(Debug, Clone)]
pub struct ChatGuard {
    routes: RoutesConfig,
}

impl ChatGuard {
    pub fn new(routes: RoutesConfig) -> Self {
        ChatGuard { routes }
    }
}

impl Guard for ChatGuard {
    fn name(&self) -> &str {
        "chat-guard"
    }

    fn evaluate(&self, auth: &AuthState, _context: &GuardContext) -> GuardDecision {
        let status = auth.profile.as_ref().and_then(|p| p.affiliate_status.as_ref());
        if status == Some(&AffiliateStatus::Approved) {
            return GuardDecision::RenderChildren;
        }

        let label = status.map(AffiliateStatus::label).unwrap_or("Inativo");
        GuardDecision::RenderBlocked(BlockedView {
            title: "Chat indisponível".to_string(),
            message: format!(
                "O chat está disponível apenas para afiliados aprovados. Status atual: {}.",
                label
            ),
            status_label: Some(label.to_string()),
            actions: vec![
                BlockedAction {
                    label: "Completar perfil".to_string(),
                    to: self.routes.complete_profile.clone(),
                },
                BlockedAction {
                    label: "Voltar ao dashboard".to_string(),
                    to: self.routes.dashboard.clone(),
                },
            ],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Profile;

    fn with_status(status: Option<&str>) -> AuthState {
        AuthState {
            profile: Some(Profile {
                affiliate_status: status.map(AffiliateStatus::from),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn label_of(decision: GuardDecision) -> String {
        match decision {
            GuardDecision::RenderBlocked(view) => view.status_label.unwrap(),
            other => panic!("expected blocked view, got {:?}", other),
        }
    }

    #[test]
    fn test_only_approved_passes() {
        let guard = ChatGuard::new(RoutesConfig::default());
        let ctx = GuardContext::for_path("/dashboard/chat");
        assert_eq!(
            guard.evaluate(&with_status(Some("approved")), &ctx),
            GuardDecision::RenderChildren
        );

        for (status, label) in [
            (Some("pending"), "Pendente"),
            (Some("rejected"), "Rejeitado"),
            (Some("suspended"), "Suspenso"),
            (Some("banned"), "Inativo"),
            (None, "Inativo"),
        ] {
            assert_eq!(label_of(guard.evaluate(&with_status(status), &ctx)), label);
        }
        assert_eq!(AffiliateStatus::Approved.label(), "Aprovado");
    }

    #[test]
    fn test_blocked_view_offers_two_actions() {
        let guard = ChatGuard::new(RoutesConfig::default());
        match guard.evaluate(&with_status(Some("pending")), &GuardContext::default()) {
            GuardDecision::RenderBlocked(view) => {
                let targets: Vec<_> = view.actions.iter().map(|a| a.to.as_str()).collect();
                assert_eq!(targets, vec!["/complete-profile", "/dashboard"]);
                assert!(view.message.contains("Pendente"));
            }
            other => panic!("expected blocked view, got {:?}", other),
        }
    }
}
