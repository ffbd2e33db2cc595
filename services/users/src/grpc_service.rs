pub mod pb {
    tonic::include_proto!("marketplace.users.v1");
}

use std::sync::Arc;

use marketplace_platform::events::EventPublisher;
use marketplace_platform::time::to_proto;
use tonic::{Request, Response, Status};

use crate::domain::UserService;
use crate::repository::UserRecord;
use pb::user_service_server::UserService as UserServiceTrait;
use pb::*;

fn to_proto_user(record: &UserRecord) -> User {
    User {
        id: record.id.clone(),
        username: record.username.clone(),
        email: record.email.clone(),
        phone: record.phone.clone(),
        role: record.role.clone(),
        active: record.active,
        email_verified: record.email_verified,
        verified_at: record.verified_at.map(to_proto),
        created_at: Some(to_proto(record.created_at)),
        updated_at: Some(to_proto(record.updated_at)),
    }
}

fn caller_id(req: &Request<impl Sized>) -> Result<String, Status> {
    req.extensions()
        .get::<marketplace_platform::auth::Claims>()
        .map(|c| c.user_id.clone())
        .ok_or_else(|| Status::unauthenticated("missing verified claims"))
}

fn caller_is_admin(req: &Request<impl Sized>) -> bool {
    req.extensions()
        .get::<marketplace_platform::auth::Claims>()
        .map(|c| c.is_admin())
        .unwrap_or(false)
}

pub struct UserGrpcService<E: EventPublisher> {
    pub domain: Arc<UserService<E>>,
}

#[tonic::async_trait]
impl<E: EventPublisher + 'static> UserServiceTrait for UserGrpcService<E> {
    async fn register(&self, request: Request<RegisterRequest>) -> Result<Response<UserReply>, Status> {
        let req = request.into_inner();
        let user = self
            .domain
            .register(req.username, req.email, req.password, req.phone)
            .await
            .map_err(|e| e.to_status())?;
        Ok(Response::new(UserReply { user: Some(to_proto_user(&user)) }))
    }

    async fn login(&self, request: Request<LoginRequest>) -> Result<Response<LoginReply>, Status> {
        let req = request.into_inner();
        let (token, user) = self.domain.login(&req.email, &req.password).await.map_err(|e| e.to_status())?;
        Ok(Response::new(LoginReply { token, user: Some(to_proto_user(&user)) }))
    }

    async fn get_profile(&self, request: Request<GetProfileRequest>) -> Result<Response<UserReply>, Status> {
        let req = request.into_inner();
        let user = self.domain.get_profile(&req.user_id).map_err(|e| e.to_status())?;
        Ok(Response::new(UserReply { user: Some(to_proto_user(&user)) }))
    }

    async fn update_profile(&self, request: Request<UpdateProfileRequest>) -> Result<Response<UserReply>, Status> {
        let caller = caller_id(&request)?;
        let admin = caller_is_admin(&request);
        let req = request.into_inner();
        let user = self
            .domain
            .update_profile(&caller, &req.user_id, admin, non_empty(req.username), non_empty(req.phone))
            .await
            .map_err(|e| e.to_status())?;
        Ok(Response::new(UserReply { user: Some(to_proto_user(&user)) }))
    }

    async fn change_password(&self, request: Request<ChangePasswordRequest>) -> Result<Response<Empty>, Status> {
        let caller = caller_id(&request)?;
        let req = request.into_inner();
        self.domain
            .change_password(&caller, &req.old_password, &req.new_password)
            .await
            .map_err(|e| e.to_status())?;
        Ok(Response::new(Empty {}))
    }

    async fn delete_account(&self, request: Request<DeleteAccountRequest>) -> Result<Response<Empty>, Status> {
        let caller = caller_id(&request)?;
        let admin = caller_is_admin(&request);
        let req = request.into_inner();
        self.domain.delete_account(&caller, &req.user_id, admin).await.map_err(|e| e.to_status())?;
        Ok(Response::new(Empty {}))
    }

    async fn deactivate_account(&self, request: Request<DeactivateAccountRequest>) -> Result<Response<Empty>, Status> {
        let caller = caller_id(&request)?;
        let admin = caller_is_admin(&request);
        let req = request.into_inner();
        self.domain.deactivate_account(&caller, &req.user_id, admin).await.map_err(|e| e.to_status())?;
        Ok(Response::new(Empty {}))
    }

    async fn admin_list_users(&self, request: Request<AdminListUsersRequest>) -> Result<Response<AdminListUsersReply>, Status> {
        let req = request.into_inner();
        let (items, total) = self.domain.admin_list(req.page as u32, req.limit as u32);
        Ok(Response::new(AdminListUsersReply {
            items: items.iter().map(to_proto_user).collect(),
            total_count: total as i64,
            page: req.page,
            limit: req.limit,
        }))
    }

    async fn admin_search_users(&self, request: Request<AdminSearchUsersRequest>) -> Result<Response<AdminListUsersReply>, Status> {
        let req = request.into_inner();
        let (items, total) = self.domain.admin_search(&req.query, req.page as u32, req.limit as u32);
        Ok(Response::new(AdminListUsersReply {
            items: items.iter().map(to_proto_user).collect(),
            total_count: total as i64,
            page: req.page,
            limit: req.limit,
        }))
    }

    async fn admin_delete_user(&self, request: Request<AdminDeleteUserRequest>) -> Result<Response<Empty>, Status> {
        let req = request.into_inner();
        self.domain.admin_delete(&req.user_id).await.map_err(|e| e.to_status())?;
        Ok(Response::new(Empty {}))
    }

    async fn admin_update_role(&self, request: Request<AdminUpdateRoleRequest>) -> Result<Response<UserReply>, Status> {
        let req = request.into_inner();
        let user = self.domain.admin_update_role(&req.user_id, req.role).map_err(|e| e.to_status())?;
        Ok(Response::new(UserReply { user: Some(to_proto_user(&user)) }))
    }

    async fn admin_set_active(&self, request: Request<AdminSetActiveRequest>) -> Result<Response<UserReply>, Status> {
        let req = request.into_inner();
        let user = self.domain.admin_set_active(&req.user_id, req.active).map_err(|e| e.to_status())?;
        Ok(Response::new(UserReply { user: Some(to_proto_user(&user)) }))
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}
