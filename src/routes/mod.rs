/// Router Module Index
///
/// `public` holds unauthenticated routes. `private` holds the per-resource CRUD groups,
/// mounted by `create_router` once under `/api/Admin/private` (admin only) and once under
/// `/api/Subadmin/private` (subadmin or admin).
pub mod public;

pub mod private;
