use tracing::debug;

use super::{Guard, GuardContext};
use crate::config::RoutesConfig;
use crate::models::{
    AuthState, BlockedAction, BlockedView, GuardDecision, Profile, Redirect, RedirectReason,
};

/// Gates subtrees that additionally need a complete profile.
///
/// Onboarding is enforced with a redirect, premium routes with an inline
/// blocked view. Admins bypass both.
#[derive(Debug, Clone)]
pub struct ProfileGuard {
    routes: RoutesConfig,
}

impl ProfileGuard {
    pub fn new(routes: RoutesConfig) -> Self {
        ProfileGuard { routes }
    }

    pub fn is_premium(&self, path: &str) -> bool {
        self.routes.premium.iter().any(|route| {
            path == route
                || path
                    .strip_prefix(route.as_str())
                    .map(|rest| rest.starts_with('/'))
                    .unwrap_or(false)
        })
    }

    fn blocked_view(&self) -> BlockedView {
        BlockedView {
            title: "Perfil incompleto".to_string(),
            message: "Complete seu perfil para acessar este recurso.".to_string(),
            status_label: None,
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
        }
    }
}

impl Guard for ProfileGuard {
    fn name(&self) -> &str {
        "profile-guard"
    }

    fn evaluate(&self, auth: &AuthState, context: &GuardContext) -> GuardDecision {
        if auth.loading {
            return GuardDecision::ShowLoading {
                escape_available: false,
            };
        }

        if auth.user.is_none() {
            return GuardDecision::Redirect(Redirect::with_reason(
                self.routes.login.clone(),
                context.path.clone(),
                RedirectReason::NotAuthenticated,
            ));
        }

        if context.path == self.routes.complete_profile {
            return GuardDecision::RenderChildren;
        }

        let empty = Profile::default();
        let profile = auth.profile().unwrap_or(&empty);

        if profile.is_elevated() {
            return GuardDecision::RenderChildren;
        }

        if profile.is_complete() {
            return GuardDecision::RenderChildren;
        }

        let first_visit = !context.skip_profile_completion && !profile.has_first_name();
        if context.force_profile_completion || first_visit {
            debug!(
                guard = self.name(),
                path = context.path.as_str(),
                forced = context.force_profile_completion,
                "sending user to profile completion"
            );
            return GuardDecision::Redirect(Redirect::replace(self.routes.complete_profile.clone()));
        }

        if self.is_premium(&context.path) {
            return GuardDecision::RenderBlocked(self.blocked_view());
        }

        GuardDecision::RenderChildren
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Identity, Session};

    fn signed_in(profile: Profile) -> AuthState {
        AuthState {
            user: Some(Identity {
                id: "u-1".to_string(),
                email: "ana@example.com".to_string(),
                provider: None,
                metadata: Default::default(),
            }),
            session: Some(Session {
                access_token: "token".to_string(),
                expires_at: None,
            }),
            profile: Some(profile),
            loading: false,
        }
    }

    fn named_but_incomplete() -> Profile {
        Profile {
            first_name: Some("Ana".to_string()),
            ..Default::default()
        }
    }

    fn guard() -> ProfileGuard {
        ProfileGuard::new(RoutesConfig::default())
    }

    #[test]
    fn test_admin_bypasses_everything() {
        let guard = guard();
        for role in ["admin", "super_admin"] {
            let auth = signed_in(Profile {
                role: Some(role.to_string()),
                ..Default::default()
            });
            for path in ["/dashboard", "/dashboard/payments", "/dashboard/reports/2024"] {
                let mut ctx = GuardContext::for_path(path);
                ctx.force_profile_completion = true;
                assert_eq!(
                    guard.evaluate(&auth, &ctx),
                    GuardDecision::RenderChildren,
                    "{} on {}",
                    role,
                    path
                );
            }
        }
    }

    #[test]
    fn test_premium_route_with_incomplete_profile_is_blocked_inline() {
        let decision = guard().evaluate(
            &signed_in(named_but_incomplete()),
            &GuardContext::for_path("/dashboard/commissions"),
        );
        match decision {
            GuardDecision::RenderBlocked(view) => {
                assert_eq!(view.actions.len(), 2);
                assert_eq!(view.actions[0].to, "/complete-profile");
                assert_eq!(view.actions[1].to, "/dashboard");
            }
            other => panic!("expected blocked view, got {:?}", other),
        }
    }

    #[test]
    fn test_incomplete_profile_keeps_general_dashboard() {
        assert_eq!(
            guard().evaluate(
                &signed_in(named_but_incomplete()),
                &GuardContext::for_path("/dashboard")
            ),
            GuardDecision::RenderChildren
        );
    }

    #[test]
    fn test_first_visit_redirects_unless_skipped() {
        let guard = guard();
        let auth = signed_in(Profile::default());

        let decision = guard.evaluate(&auth, &GuardContext::for_path("/dashboard"));
        assert_eq!(decision.redirect().unwrap().to, "/complete-profile");

        let mut skipped = GuardContext::for_path("/dashboard");
        skipped.skip_profile_completion = true;
        assert_eq!(guard.evaluate(&auth, &skipped), GuardDecision::RenderChildren);
    }

    #[test]
    fn test_forced_completion_redirects() {
        let mut ctx = GuardContext::for_path("/dashboard");
        ctx.force_profile_completion = true;
        ctx.skip_profile_completion = true;
        let decision = guard().evaluate(&signed_in(named_but_incomplete()), &ctx);
        assert_eq!(decision.redirect().unwrap().to, "/complete-profile");
    }

    #[test]
    fn test_completion_route_always_allowed() {
        let decision = guard().evaluate(
            &signed_in(Profile::default()),
            &GuardContext::for_path("/complete-profile"),
        );
        assert_eq!(decision, GuardDecision::RenderChildren);
    }

    #[test]
    fn test_loading_and_anonymous() {
        let guard = guard();
        assert!(guard
            .evaluate(&AuthState::loading(), &GuardContext::for_path("/dashboard"))
            .is_loading());
        let decision = guard.evaluate(&AuthState::default(), &GuardContext::for_path("/dashboard"));
        assert_eq!(decision.redirect().unwrap().to, "/login");
    }

    #[test]
    fn test_premium_matching_respects_segments() {
        let guard = guard();
        assert!(guard.is_premium("/dashboard/payments"));
        assert!(guard.is_premium("/dashboard/payments/history"));
        assert!(!guard.is_premium("/dashboard/paymentsx"));
        assert!(!guard.is_premium("/dashboard"));
    }
}
