//! Repository authentication.
//!
//! Credentials are configured per-repository via `RemoteRepository` fields,
//! typically populated by interpolating `${env:SECRET}` references (see
//! `resolver_model::properties`) from an environment file before the
//! repository is constructed.

use reqwest::RequestBuilder;

use crate::repository::RemoteRepository;

/// Apply authentication to a request if the repository has credentials.
/// Basic auth takes precedence over a bearer token when both are set.
pub fn apply_auth(request: RequestBuilder, repo: &RemoteRepository) -> RequestBuilder {
    match (&repo.username, &repo.password, &repo.token) {
        (Some(user), Some(pass), _) => request.basic_auth(user, Some(pass)),
        (Some(user), None, _) => request.basic_auth(user, None::<&str>),
        (None, _, Some(token)) => request.bearer_auth(token),
        (None, _, None) => request,
    }
}
