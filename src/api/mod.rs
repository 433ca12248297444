pub(crate) mod academics;
pub(crate) mod answers;
pub(crate) mod auth;
pub(crate) mod errors;
pub(crate) mod exams;
pub(crate) mod extract;
pub(crate) mod grades;
pub(crate) mod guards;
pub(crate) mod handlers;
pub(crate) mod modules;
pub(crate) mod pagination;
pub(crate) mod questions;
pub(crate) mod router;
pub(crate) mod users;
