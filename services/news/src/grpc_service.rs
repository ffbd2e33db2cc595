pub mod pb {
    tonic::include_proto!("marketplace.news.v1");
}

use std::sync::Arc;

use marketplace_platform::cache::CachePort;
use marketplace_platform::events::EventPublisher;
use marketplace_platform::time::to_proto;
use tonic::{Request, Response, Status};

use crate::domain::NewsService;
use crate::repository::{CommentRecord, NewsRecord, NewsUpdate};
use pb::news_service_server::NewsService as NewsServiceTrait;
use pb::*;

fn to_proto_news(record: &NewsRecord) -> News {
    News {
        id: record.id.clone(),
        title: record.title.clone(),
        content: record.content.clone(),
        author_user_id: record.author_user_id.clone(),
        image_url: record.image_url.clone(),
        category: record.category.clone(),
        created_at: Some(to_proto(record.created_at)),
        updated_at: Some(to_proto(record.updated_at)),
    }
}

fn to_proto_comment(record: &CommentRecord) -> Comment {
    Comment {
        id: record.id.clone(),
        news_id: record.news_id.clone(),
        author_user_id: record.author_user_id.clone(),
        content: record.content.clone(),
        created_at: Some(to_proto(record.created_at)),
        updated_at: Some(to_proto(record.updated_at)),
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

pub struct NewsGrpcService<C: CachePort, E: EventPublisher> {
    pub domain: Arc<NewsService<C, E>>,
}

#[tonic::async_trait]
impl<C: CachePort + 'static, E: EventPublisher + 'static> NewsServiceTrait for NewsGrpcService<C, E> {
    async fn create_news(&self, request: Request<CreateNewsRequest>) -> Result<Response<NewsReply>, Status> {
        let req = request.into_inner();
        let news = self
            .domain
            .create_news(req.author_user_id, req.title, req.content, req.image_url, req.category)
            .await
            .map_err(|e| e.to_status())?;
        Ok(Response::new(NewsReply { news: Some(to_proto_news(&news)) }))
    }

    async fn update_news(&self, request: Request<UpdateNewsRequest>) -> Result<Response<NewsReply>, Status> {
        let req = request.into_inner();
        let update = NewsUpdate {
            title: non_empty(req.title),
            content: non_empty(req.content),
            image_url: non_empty(req.image_url),
            category: non_empty(req.category),
        };
        let news = self
            .domain
            .update_news(&req.news_id, &req.caller_user_id, req.caller_is_admin, update)
            .await
            .map_err(|e| e.to_status())?;
        Ok(Response::new(NewsReply { news: Some(to_proto_news(&news)) }))
    }

    async fn get_news(&self, request: Request<GetNewsRequest>) -> Result<Response<NewsReply>, Status> {
        let req = request.into_inner();
        let news = self.domain.get_news(&req.news_id).await.map_err(|e| e.to_status())?;
        Ok(Response::new(NewsReply { news: Some(to_proto_news(&news)) }))
    }

    async fn list_news(&self, request: Request<ListNewsRequest>) -> Result<Response<ListNewsReply>, Status> {
        let req = request.into_inner();
        let (items, total, page, limit) = self.domain.list_news(
            non_empty(req.category).as_deref(),
            non_empty(req.author_id).as_deref(),
            req.page as i64,
            req.limit as i64,
        );
        Ok(Response::new(ListNewsReply {
            items: items.iter().map(to_proto_news).collect(),
            total_count: total as i64,
            page: page as i32,
            limit: limit as i32,
        }))
    }

    async fn delete_news_and_associated_data(&self, request: Request<DeleteNewsRequest>) -> Result<Response<Empty>, Status> {
        let req = request.into_inner();
        self.domain
            .delete_news_and_associated_data(&req.news_id, &req.caller_user_id, req.caller_is_admin)
            .await
            .map_err(|e| e.to_status())?;
        Ok(Response::new(Empty {}))
    }

    async fn add_comment(&self, request: Request<AddCommentRequest>) -> Result<Response<CommentReply>, Status> {
        let req = request.into_inner();
        let comment = self
            .domain
            .add_comment(&req.news_id, req.author_user_id, req.content)
            .await
            .map_err(|e| e.to_status())?;
        Ok(Response::new(CommentReply { comment: Some(to_proto_comment(&comment)) }))
    }

    async fn delete_comment(&self, request: Request<DeleteCommentRequest>) -> Result<Response<Empty>, Status> {
        let req = request.into_inner();
        self.domain
            .delete_comment(&req.comment_id, &req.caller_user_id, req.caller_is_admin)
            .await
            .map_err(|e| e.to_status())?;
        Ok(Response::new(Empty {}))
    }

    async fn list_comments(&self, request: Request<ListCommentsRequest>) -> Result<Response<ListCommentsReply>, Status> {
        let req = request.into_inner();
        let items = self.domain.list_comments(&req.news_id);
        Ok(Response::new(ListCommentsReply { items: items.iter().map(to_proto_comment).collect() }))
    }

    async fn toggle_like(&self, request: Request<ToggleLikeRequest>) -> Result<Response<ToggleLikeReply>, Status> {
        let req = request.into_inner();
        let liked = self
            .domain
            .toggle_like(&req.content_type, &req.content_id, &req.user_id)
            .await
            .map_err(|e| e.to_status())?;
        Ok(Response::new(ToggleLikeReply { liked }))
    }
}
