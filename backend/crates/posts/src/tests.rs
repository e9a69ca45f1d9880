//! Behaviour tests for the posts crate

#[cfg(test)]
mod fixtures {
    use auth::User;
    use auth::domain::entity::user::NewUser;
    use auth::domain::value_object::{
        email::Email,
        user_password::{RawPassword, UserPassword},
    };
    use chrono::{Duration, Utc};

    use crate::domain::entity::post::Post;
    use auth::UserRole;

    pub const PASSWORD: &str = "Pothole#Main-Street";

    /// Verified citizen of `city` unless `verified` is false.
    pub fn user(email: &str, city: &str, role: UserRole, verified: bool) -> User {
        let raw = RawPassword::new(PASSWORD.to_string()).unwrap();
        let mut user = User::new(NewUser {
            email: Email::new(email).unwrap(),
            password: UserPassword::from_raw(&raw, None).unwrap(),
            first_name: "Ivo".to_string(),
            last_name: "Kovač".to_string(),
            city: city.to_string(),
            address: Some("Ilica 1".to_string()),
        });
        if verified {
            assert!(user.verify_address());
        }
        user.set_role(role);
        user
    }

    /// Post by `owner`, created `minutes_ago`.
    pub fn post(owner: &User, title: &str, minutes_ago: i64) -> Post {
        let mut post = Post::new(
            title.to_string(),
            "Deep pothole in the right lane".to_string(),
            owner.user_id,
            owner.city.clone(),
        );
        post.created_at = Utc::now() - Duration::minutes(minutes_ago);
        post.updated_at = post.created_at;
        post
    }
}

#[cfg(test)]
mod error_tests {
    use crate::error::*;
    use auth::{AuthError, UserRole};
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    #[test]
    fn test_error_into_response_status_codes() {
        let test_cases: Vec<(PostError, StatusCode)> = vec![
            (PostError::NotFound, StatusCode::NOT_FOUND),
            (PostError::Forbidden, StatusCode::FORBIDDEN),
            (
                PostError::InvalidArgument("bad sort".into()),
                StatusCode::BAD_REQUEST,
            ),
            (PostError::TooManyFiles, StatusCode::BAD_REQUEST),
            (PostError::Unauthorized, StatusCode::UNAUTHORIZED),
            (PostError::Conflict("race".into()), StatusCode::CONFLICT),
            (
                PostError::Auth(AuthError::TokenMissing),
                StatusCode::UNAUTHORIZED,
            ),
            (
                PostError::Auth(AuthError::InsufficientRole {
                    required: UserRole::Moderator,
                }),
                StatusCode::FORBIDDEN,
            ),
            (
                PostError::Internal("test".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected_status) in test_cases {
            let response = error.into_response();
            assert_eq!(response.status(), expected_status);
        }
    }

    #[test]
    fn test_too_many_files_message() {
        assert_eq!(
            PostError::TooManyFiles.to_string(),
            "You can only upload up to 4 files"
        );
    }
}

#[cfg(test)]
mod vote_tests {
    use std::sync::Arc;

    use auth::{MemoryUserRepository, UserRole};
    use futures::future::join_all;
    use kernel::id::PostId;

    use super::fixtures;
    use crate::application::VoteUseCase;
    use crate::domain::repository::PostRepository;
    use crate::domain::value_object::outcome::{FavouriteOutcome, VoteOutcome};
    use crate::error::PostError;
    use crate::infra::memory::MemoryPostRepository;

    struct Setup {
        users: MemoryUserRepository,
        posts: MemoryPostRepository,
        votes: VoteUseCase<MemoryPostRepository>,
        voter: auth::User,
        post_id: PostId,
    }

    async fn setup() -> Setup {
        let users = MemoryUserRepository::new();
        let owner = fixtures::user("owner@example.org", "Zagreb", UserRole::User, true);
        let voter = fixtures::user("voter@example.org", "Zagreb", UserRole::User, true);
        users.insert(owner.clone());
        users.insert(voter.clone());

        let posts = MemoryPostRepository::with_users(users.clone());
        let post = fixtures::post(&owner, "Broken streetlight", 0);
        posts.insert(&post).await.unwrap();

        Setup {
            votes: VoteUseCase::new(Arc::new(posts.clone())),
            users,
            posts,
            voter,
            post_id: post.post_id,
        }
    }

    #[tokio::test]
    async fn test_upvote_toggles_back_off() {
        let s = setup().await;

        let first = s.votes.upvote(&s.post_id, &s.voter.user_id).await.unwrap();
        assert_eq!(first, VoteOutcome::Added);
        assert_eq!(s.posts.get(&s.post_id).unwrap().upvoted_by, vec![s.voter.user_id]);

        let second = s.votes.upvote(&s.post_id, &s.voter.user_id).await.unwrap();
        assert_eq!(second, VoteOutcome::Removed);

        let post = s.posts.get(&s.post_id).unwrap();
        assert!(post.upvoted_by.is_empty());
        assert!(s.users.get(&s.voter.user_id).unwrap().upvoted_posts.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_toggles_by_distinct_users_all_land() {
        let s = setup().await;
        let votes = Arc::new(s.votes);

        let voters: Vec<auth::User> = (0..24)
            .map(|i| {
                let user = fixtures::user(
                    &format!("crowd{i}@example.org"),
                    "Zagreb",
                    UserRole::User,
                    true,
                );
                s.users.insert(user.clone());
                user
            })
            .collect();

        let tasks = voters.iter().flat_map(|voter| {
            let (up, fav) = (votes.clone(), votes.clone());
            let (post_id, user_id) = (s.post_id, voter.user_id);
            [
                tokio::spawn(async move { up.upvote(&post_id, &user_id).await.map(|_| ()) }),
                tokio::spawn(async move { fav.favourite(&post_id, &user_id).await.map(|_| ()) }),
            ]
        });
        for result in join_all(tasks).await {
            result.unwrap().unwrap();
        }

        let post = s.posts.get(&s.post_id).unwrap();
        assert_eq!(post.upvoted_by.len(), voters.len());
        assert_eq!(post.favourite_by.len(), voters.len());
        for voter in &voters {
            assert!(post.upvoted_by.contains(&voter.user_id));
            assert!(post.favourite_by.contains(&voter.user_id));
            let user = s.users.get(&voter.user_id).unwrap();
            assert_eq!(user.upvoted_posts, vec![s.post_id]);
            assert_eq!(user.favourite_posts, vec![s.post_id]);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_racing_up_and_down_never_holds_both() {
        let s = setup().await;
        let votes = Arc::new(s.votes);
        let (post_id, user_id) = (s.post_id, s.voter.user_id);

        for _ in 0..50 {
            let (up, down) = (votes.clone(), votes.clone());
            let results = join_all([
                tokio::spawn(async move { up.upvote(&post_id, &user_id).await }),
                tokio::spawn(async move { down.downvote(&post_id, &user_id).await }),
            ])
            .await;
            for result in results {
                result.unwrap().unwrap();
            }

            let post = s.posts.get(&post_id).unwrap();
            let up_count = post.upvoted_by.iter().filter(|id| **id == user_id).count();
            let down_count = post.downvoted_by.iter().filter(|id| **id == user_id).count();
            assert!(up_count + down_count <= 1, "voter in both vote sets");

            let voter = s.users.get(&user_id).unwrap();
            assert_eq!(voter.upvoted_posts.len(), up_count);
            assert_eq!(voter.downvoted_posts.len(), down_count);
        }
    }

    #[tokio::test]
    async fn test_votes_are_mutually_exclusive() {
        let s = setup().await;

        s.votes.upvote(&s.post_id, &s.voter.user_id).await.unwrap();
        let outcome = s.votes.downvote(&s.post_id, &s.voter.user_id).await.unwrap();
        assert_eq!(outcome, VoteOutcome::AddedAndOppositeRemoved);

        let post = s.posts.get(&s.post_id).unwrap();
        assert!(post.upvoted_by.is_empty());
        assert_eq!(post.downvoted_by, vec![s.voter.user_id]);

        let voter = s.users.get(&s.voter.user_id).unwrap();
        assert!(voter.upvoted_posts.is_empty());
        assert_eq!(voter.downvoted_posts, vec![s.post_id]);
    }

    #[tokio::test]
    async fn test_favourite_is_independent_of_votes() {
        let s = setup().await;

        s.votes.downvote(&s.post_id, &s.voter.user_id).await.unwrap();
        let added = s.votes.favourite(&s.post_id, &s.voter.user_id).await.unwrap();
        assert_eq!(added, FavouriteOutcome::Added);

        let post = s.posts.get(&s.post_id).unwrap();
        assert_eq!(post.downvoted_by, vec![s.voter.user_id]);
        assert_eq!(post.favourite_by, vec![s.voter.user_id]);
        assert_eq!(
            s.users.get(&s.voter.user_id).unwrap().favourite_posts,
            vec![s.post_id]
        );

        let removed = s.votes.favourite(&s.post_id, &s.voter.user_id).await.unwrap();
        assert_eq!(removed, FavouriteOutcome::Removed);
        assert_eq!(
            s.posts.get(&s.post_id).unwrap().downvoted_by,
            vec![s.voter.user_id]
        );
    }

    #[tokio::test]
    async fn test_vote_on_missing_post() {
        let s = setup().await;
        let result = s.votes.upvote(&PostId::new(), &s.voter.user_id).await;
        assert!(matches!(result, Err(PostError::NotFound)));
    }

    #[tokio::test]
    async fn test_delete_clears_back_references() {
        let s = setup().await;
        s.votes.upvote(&s.post_id, &s.voter.user_id).await.unwrap();
        s.votes.favourite(&s.post_id, &s.voter.user_id).await.unwrap();

        s.posts.delete(&s.post_id, None).await.unwrap();

        let voter = s.users.get(&s.voter.user_id).unwrap();
        assert!(voter.upvoted_posts.is_empty());
        assert!(voter.favourite_posts.is_empty());
    }
}

#[cfg(test)]
mod lifecycle_tests {
    use std::sync::Arc;

    use auth::{MemoryUserRepository, UserRole};
    use kernel::id::{PostId, UserId};

    use super::fixtures;
    use crate::application::{
        ChangeStatusUseCase, CreatePostInput, CreatePostUseCase, EditPostInput, EditPostUseCase,
        ListPostsUseCase, PostsConfig, VerifyPostUseCase,
    };
    use crate::domain::value_object::post_sort::PostSort;
    use crate::domain::value_object::post_status::PostStatus;
    use crate::error::PostError;
    use crate::infra::memory::MemoryPostRepository;

    fn input(title: &str) -> CreatePostInput {
        CreatePostInput {
            title: title.to_string(),
            description: "Water leaking onto the road".to_string(),
            city: "Split".to_string(),
        }
    }

    #[tokio::test]
    async fn test_unverified_user_cannot_report() {
        let users = Arc::new(MemoryUserRepository::new());
        let citizen = fixtures::user("new@example.org", "Split", UserRole::User, false);
        users.insert(citizen.clone());

        let create = CreatePostUseCase::new(
            Arc::new(MemoryPostRepository::new()),
            users,
            Arc::new(PostsConfig::default()),
        );
        let result = create.execute(&citizen.user_id, input("Leak")).await;

        assert!(matches!(result, Err(PostError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_unverified_check_precedes_field_validation() {
        let users = Arc::new(MemoryUserRepository::new());
        let citizen = fixtures::user("blank@example.org", "Split", UserRole::User, false);
        users.insert(citizen.clone());
        let posts = Arc::new(MemoryPostRepository::new());

        let create = CreatePostUseCase::new(posts.clone(), users, Arc::new(PostsConfig::default()));
        let blank = CreatePostInput {
            title: String::new(),
            description: "  ".to_string(),
            city: String::new(),
        };
        let result = create.execute(&citizen.user_id, blank).await;

        assert!(matches!(result, Err(PostError::Unauthorized)));
        assert!(posts.is_empty());
    }

    #[tokio::test]
    async fn test_blank_title_is_rejected() {
        let users = Arc::new(MemoryUserRepository::new());
        let citizen = fixtures::user("c@example.org", "Split", UserRole::User, true);
        users.insert(citizen.clone());

        let create = CreatePostUseCase::new(
            Arc::new(MemoryPostRepository::new()),
            users,
            Arc::new(PostsConfig::default()),
        );
        let result = create.execute(&citizen.user_id, input("   ")).await;

        assert!(matches!(result, Err(PostError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_edit_requires_ownership() {
        let users = Arc::new(MemoryUserRepository::new());
        let owner = fixtures::user("o@example.org", "Split", UserRole::User, true);
        users.insert(owner.clone());
        let posts = Arc::new(MemoryPostRepository::new());
        let config = Arc::new(PostsConfig::default());

        let post_id = CreatePostUseCase::new(posts.clone(), users, config.clone())
            .execute(&owner.user_id, input("Leak"))
            .await
            .unwrap();

        let edit = EditPostUseCase::new(posts.clone(), config);
        let change = || EditPostInput {
            title: "Burst pipe".to_string(),
            description: "Getting worse".to_string(),
        };

        let stranger = edit.execute(&post_id, &UserId::new(), change()).await;
        assert!(matches!(stranger, Err(PostError::Forbidden)));

        let missing = edit.execute(&PostId::new(), &owner.user_id, change()).await;
        assert!(matches!(missing, Err(PostError::NotFound)));

        edit.execute(&post_id, &owner.user_id, change()).await.unwrap();
        assert_eq!(posts.get(&post_id).unwrap().title, "Burst pipe");
    }

    #[tokio::test]
    async fn test_change_status_checks_status_before_id() {
        let status = ChangeStatusUseCase::new(Arc::new(MemoryPostRepository::new()));

        let unknown_status = status.execute("not-a-uuid", "closed").await;
        assert!(matches!(unknown_status, Err(PostError::InvalidArgument(_))));

        let unknown_post = status.execute(&PostId::new().to_string(), "seen").await;
        assert!(matches!(unknown_post, Err(PostError::NotFound)));
    }

    #[tokio::test]
    async fn test_report_moderation_and_resolution() {
        let users = Arc::new(MemoryUserRepository::new());
        let citizen = fixtures::user("c@example.org", "Split", UserRole::User, true);
        let moderator = fixtures::user("m@example.org", "Split", UserRole::Moderator, true);
        let elsewhere = fixtures::user("z@example.org", "Zagreb", UserRole::Moderator, true);
        users.insert(citizen.clone());
        users.insert(moderator.clone());
        users.insert(elsewhere.clone());

        let posts = Arc::new(MemoryPostRepository::new());
        let config = Arc::new(PostsConfig::default());
        let list = ListPostsUseCase::new(posts.clone(), users.clone());

        let post_id = CreatePostUseCase::new(posts.clone(), users.clone(), config)
            .execute(&citizen.user_id, input("Leak"))
            .await
            .unwrap();

        // Hidden from the public until approved
        let public = list.list_all(None, PostSort::Date).await.unwrap();
        assert!(public.posts.is_empty());

        let queue = list.list_unverified_for_moderator(&moderator.user_id).await.unwrap();
        assert_eq!(queue.len(), 1);
        let other_city = list.list_unverified_for_moderator(&elsewhere.user_id).await.unwrap();
        assert!(other_city.is_empty());

        VerifyPostUseCase::new(posts.clone())
            .execute(&post_id)
            .await
            .unwrap();
        let approved = posts.get(&post_id).unwrap();
        assert!(approved.verified);
        assert_eq!(approved.status, PostStatus::Sent);

        ChangeStatusUseCase::new(posts.clone())
            .execute(&post_id.to_string(), "resolved")
            .await
            .unwrap();

        let public = list.list_by_city("Split", PostSort::Date).await.unwrap();
        assert_eq!(public.len(), 1);
        assert_eq!(public[0].status, PostStatus::Resolved);
        assert!(list
            .list_unverified_for_moderator(&moderator.user_id)
            .await
            .unwrap()
            .is_empty());

        let own = list.list_by_user(&citizen.user_id).await.unwrap();
        assert_eq!(own.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_moderator_is_not_found() {
        let list = ListPostsUseCase::new(
            Arc::new(MemoryPostRepository::new()),
            Arc::new(MemoryUserRepository::new()),
        );
        let result = list.list_unverified_for_moderator(&UserId::new()).await;
        assert!(matches!(result, Err(PostError::NotFound)));
    }
}

#[cfg(test)]
mod query_tests {
    use std::sync::Arc;

    use auth::{MemoryUserRepository, UserRole};
    use kernel::id::UserId;

    use super::fixtures;
    use crate::application::ListPostsUseCase;
    use crate::domain::repository::{PostFilter, PostRepository};
    use crate::domain::value_object::outcome::VoteKind;
    use crate::domain::value_object::page::PageRequest;
    use crate::domain::value_object::post_sort::PostSort;
    use crate::domain::value_object::post_status::PostStatus;
    use crate::infra::memory::MemoryPostRepository;

    /// `count` verified posts, newest first by title index.
    async fn seeded(count: i64) -> (MemoryPostRepository, auth::User) {
        let owner = fixtures::user("o@example.org", "Osijek", UserRole::User, true);
        let posts = MemoryPostRepository::new();
        for i in 0..count {
            let mut post = fixtures::post(&owner, &format!("Report {i}"), i);
            post.verified = true;
            posts.insert(&post).await.unwrap();
        }
        (posts, owner)
    }

    #[tokio::test]
    async fn test_first_and_last_page() {
        let (posts, _) = seeded(10).await;
        let list = ListPostsUseCase::new(Arc::new(posts), Arc::new(MemoryUserRepository::new()));

        let first = list
            .list_all(Some(PageRequest::new(1, 3).unwrap()), PostSort::Date)
            .await
            .unwrap();
        let titles: Vec<_> = first.posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Report 0", "Report 1", "Report 2"]);
        assert_eq!(first.links.next, Some(PageRequest::new(2, 3).unwrap()));
        assert_eq!(first.links.previous, None);

        let last = list
            .list_all(Some(PageRequest::new(4, 3).unwrap()), PostSort::Date)
            .await
            .unwrap();
        assert_eq!(last.posts.len(), 1);
        assert_eq!(last.posts[0].title, "Report 9");
        assert_eq!(last.links.next, None);
        assert_eq!(last.links.previous, Some(PageRequest::new(3, 3).unwrap()));
    }

    #[tokio::test]
    async fn test_sort_by_status_puts_matching_first() {
        let (posts, _) = seeded(3).await;
        let all = posts
            .list(&PostFilter::Verified, PostSort::Date, None)
            .await
            .unwrap();
        // Oldest one moves to the front
        posts.set_status(&all[2].post_id, PostStatus::InProgress).await.unwrap();

        let list = ListPostsUseCase::new(Arc::new(posts), Arc::new(MemoryUserRepository::new()));
        let sorted = list
            .list_all(None, PostSort::Status(PostStatus::InProgress))
            .await
            .unwrap();
        let titles: Vec<_> = sorted.posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Report 2", "Report 0", "Report 1"]);
    }

    #[tokio::test]
    async fn test_sort_by_upvotes() {
        let (posts, _) = seeded(3).await;
        let voters: Vec<_> = (0..2).map(|_| UserId::new()).collect();
        let all = posts
            .list(&PostFilter::Verified, PostSort::Date, None)
            .await
            .unwrap();
        for voter in &voters {
            posts
                .toggle_vote(&all[2].post_id, voter, VoteKind::Up)
                .await
                .unwrap();
        }
        posts
            .toggle_vote(&all[1].post_id, &voters[0], VoteKind::Up)
            .await
            .unwrap();

        let list = ListPostsUseCase::new(Arc::new(posts), Arc::new(MemoryUserRepository::new()));
        let sorted = list.list_all(None, PostSort::Upvotes).await.unwrap();
        let titles: Vec<_> = sorted.posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Report 2", "Report 1", "Report 0"]);
    }

    #[tokio::test]
    async fn test_unverified_posts_stay_private() {
        let (posts, owner) = seeded(2).await;
        posts.insert(&fixtures::post(&owner, "Pending", 30)).await.unwrap();

        let list = ListPostsUseCase::new(Arc::new(posts), Arc::new(MemoryUserRepository::new()));
        assert_eq!(list.list_all(None, PostSort::Date).await.unwrap().posts.len(), 2);
        assert_eq!(list.list_by_user(&owner.user_id).await.unwrap().len(), 3);
    }
}

#[cfg(test)]
mod attachment_tests {
    use std::sync::Arc;

    use auth::{MemoryUserRepository, UserRole};
    use bytes::Bytes;
    use platform::mail::RecordingMailer;
    use platform::storage::MemoryBlobStore;

    use super::fixtures;
    use crate::application::attachments::file_key;
    use crate::application::{
        AttachmentManager, DeletePostUseCase, DenyPostUseCase, PostsConfig, UploadedFile,
    };
    use crate::domain::entity::post::Post;
    use crate::domain::repository::PostRepository;
    use crate::error::PostError;
    use crate::infra::memory::MemoryPostRepository;

    fn file(name: &str) -> UploadedFile {
        UploadedFile {
            file_name: name.to_string(),
            bytes: Bytes::from_static(b"jpeg"),
        }
    }

    async fn post_in(posts: &MemoryPostRepository) -> Post {
        let owner = fixtures::user("o@example.org", "Pula", UserRole::User, true);
        let post = fixtures::post(&owner, "Fallen tree", 0);
        posts.insert(&post).await.unwrap();
        post
    }

    #[tokio::test]
    async fn test_too_many_files_leaves_post_untouched() {
        let posts = MemoryPostRepository::new();
        let blobs = Arc::new(MemoryBlobStore::new());
        let post = post_in(&posts).await;
        let manager = AttachmentManager::new(Arc::new(posts.clone()), blobs.clone());

        let first = manager.replace_all(&post.post_id, vec![file("a.jpg")]).await.unwrap();
        first.cleanup.await.unwrap();

        let files = (0..5).map(|i| file(&format!("{i}.jpg"))).collect();
        let result = manager.replace_all(&post.post_id, files).await;

        assert!(matches!(result, Err(PostError::TooManyFiles)));
        assert_eq!(posts.get(&post.post_id).unwrap().file_urls, first.file_urls);
        assert_eq!(blobs.keys().len(), 1);
    }

    #[tokio::test]
    async fn test_replace_removes_stale_blobs() {
        let posts = MemoryPostRepository::new();
        let blobs = Arc::new(MemoryBlobStore::new());
        let post = post_in(&posts).await;
        let manager = AttachmentManager::new(Arc::new(posts.clone()), blobs.clone());

        manager
            .replace_all(&post.post_id, vec![file("a.jpg"), file("b.jpg"), file("c.jpg")])
            .await
            .unwrap()
            .cleanup
            .await
            .unwrap();

        let second = manager
            .replace_all(&post.post_id, vec![file("d.jpg"), file("b.jpg")])
            .await
            .unwrap();
        second.cleanup.await.unwrap();

        let expected_keys = vec![
            file_key(&post.post_id, 0, "d.jpg"),
            file_key(&post.post_id, 1, "b.jpg"),
        ];
        let mut keys = blobs.keys();
        keys.sort();
        let mut sorted_expected = expected_keys.clone();
        sorted_expected.sort();
        assert_eq!(keys, sorted_expected);

        let urls: Vec<String> = expected_keys.iter().map(|k| format!("memory://{k}")).collect();
        assert_eq!(second.file_urls, urls);
        assert_eq!(posts.get(&post.post_id).unwrap().file_urls, urls);
    }

    #[tokio::test]
    async fn test_failed_write_is_left_out() {
        let posts = MemoryPostRepository::new();
        let blobs = Arc::new(MemoryBlobStore::new());
        let post = post_in(&posts).await;
        blobs.fail_put_of(&file_key(&post.post_id, 1, "b.jpg"));
        let manager = AttachmentManager::new(Arc::new(posts.clone()), blobs.clone());

        let output = manager
            .replace_all(&post.post_id, vec![file("a.jpg"), file("b.jpg"), file("c.jpg")])
            .await
            .unwrap();

        assert_eq!(
            output.file_urls,
            vec![
                format!("memory://{}", file_key(&post.post_id, 0, "a.jpg")),
                format!("memory://{}", file_key(&post.post_id, 2, "c.jpg")),
            ]
        );
    }

    #[tokio::test]
    async fn test_replace_on_missing_post() {
        let posts = MemoryPostRepository::new();
        let manager = AttachmentManager::new(Arc::new(posts), Arc::new(MemoryBlobStore::new()));
        let result = manager
            .replace_all(&kernel::id::PostId::new(), vec![file("a.jpg")])
            .await;
        assert!(matches!(result, Err(PostError::NotFound)));
    }

    #[tokio::test]
    async fn test_owner_delete_removes_blobs() {
        let posts = MemoryPostRepository::new();
        let blobs = Arc::new(MemoryBlobStore::new());
        let post = post_in(&posts).await;
        let stranger = fixtures::user("x@example.org", "Pula", UserRole::User, true);
        let unrelated = fixtures::post(&stranger, "Other", 0);
        blobs.insert(&file_key(&post.post_id, 0, "a.jpg"), b"a");
        blobs.insert(&file_key(&unrelated.post_id, 0, "a.jpg"), b"a");

        let delete = DeletePostUseCase::new(Arc::new(posts.clone()), blobs.clone());
        let forbidden = delete.execute(&post.post_id, &unrelated.owner_id).await;
        assert!(matches!(forbidden, Err(PostError::Forbidden)));

        delete
            .execute(&post.post_id, &post.owner_id)
            .await
            .unwrap()
            .await
            .unwrap();

        assert!(posts.is_empty());
        assert_eq!(blobs.keys(), vec![file_key(&unrelated.post_id, 0, "a.jpg")]);
    }

    #[tokio::test]
    async fn test_deny_cleans_up_and_notifies_owner() {
        let users = MemoryUserRepository::new();
        let owner = fixtures::user("owner@example.org", "Pula", UserRole::User, true);
        let moderator = fixtures::user("mod@example.org", "Pula", UserRole::Moderator, true);
        users.insert(owner.clone());
        users.insert(moderator.clone());

        let posts = MemoryPostRepository::with_users(users.clone());
        let post = fixtures::post(&owner, "Graffiti", 0);
        posts.insert(&post).await.unwrap();

        let blobs = Arc::new(MemoryBlobStore::new());
        let stuck = file_key(&post.post_id, 0, "a.jpg");
        let removable = file_key(&post.post_id, 1, "b.jpg");
        blobs.insert(&stuck, b"a");
        blobs.insert(&removable, b"b");
        blobs.fail_delete_of(&stuck);

        let mailer = Arc::new(RecordingMailer::new());
        let deny = DenyPostUseCase::new(
            Arc::new(posts.clone()),
            Arc::new(users),
            blobs.clone(),
            mailer.clone(),
            Arc::new(PostsConfig::default()),
        );

        deny.execute(&post.post_id, &moderator.user_id)
            .await
            .unwrap()
            .await
            .unwrap();

        assert!(posts.get(&post.post_id).is_none());
        assert_eq!(blobs.keys(), vec![stuck]);

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "owner@example.org");
        assert!(sent[0].body.contains("Graffiti"));
    }

    #[tokio::test]
    async fn test_failed_delete_is_retried() {
        let posts = MemoryPostRepository::new();
        let post = post_in(&posts).await;

        let blobs = Arc::new(MemoryBlobStore::new());
        let flaky = file_key(&post.post_id, 0, "a.jpg");
        blobs.insert(&flaky, b"a");
        blobs.insert(&file_key(&post.post_id, 1, "b.jpg"), b"b");
        blobs.fail_next_delete_of(&flaky);

        let manager = AttachmentManager::new(Arc::new(posts), blobs.clone());
        manager.delete_all(&post.post_id).await.unwrap();

        assert!(blobs.keys().is_empty());
    }

    #[tokio::test]
    async fn test_sweep_removes_files_of_missing_posts() {
        let posts = MemoryPostRepository::new();
        let live = post_in(&posts).await;
        let gone = kernel::id::PostId::new();

        let blobs = Arc::new(MemoryBlobStore::new());
        let kept = file_key(&live.post_id, 0, "a.jpg");
        blobs.insert(&kept, b"a");
        blobs.insert(&file_key(&gone, 0, "a.jpg"), b"a");
        blobs.insert(&file_key(&gone, 1, "b.jpg"), b"b");
        blobs.insert("readme.txt", b"not a post file");

        let manager = AttachmentManager::new(Arc::new(posts), blobs.clone());
        let orphaned = manager.sweep_orphans().await.unwrap();

        assert_eq!(orphaned, 2);
        let mut expected = vec![kept, "readme.txt".to_string()];
        expected.sort();
        assert_eq!(blobs.keys(), expected);
    }

    #[tokio::test]
    async fn test_deny_survives_mail_failure() {
        let users = MemoryUserRepository::new();
        let owner = fixtures::user("owner@example.org", "Pula", UserRole::User, true);
        users.insert(owner.clone());
        let posts = MemoryPostRepository::with_users(users.clone());
        let post = fixtures::post(&owner, "Graffiti", 0);
        posts.insert(&post).await.unwrap();

        let deny = DenyPostUseCase::new(
            Arc::new(posts.clone()),
            Arc::new(users),
            Arc::new(MemoryBlobStore::new()),
            Arc::new(RecordingMailer::failing()),
            Arc::new(PostsConfig::default()),
        );

        let handle = deny.execute(&post.post_id, &kernel::id::UserId::new()).await.unwrap();
        assert!(handle.await.is_ok());
        assert!(posts.is_empty());
    }
}

#[cfg(test)]
mod router_tests {
    use std::sync::Arc;

    use auth::{
        AuthConfig, MemoryUserRepository, TokenService, User, UserRole, users_router_generic,
    };
    use axum::Router;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use platform::mail::RecordingMailer;
    use platform::storage::{FsBlobStore, MemoryBlobStore};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::fixtures;
    use crate::application::PostsConfig;
    use crate::domain::repository::PostRepository;
    use crate::infra::memory::MemoryPostRepository;
    use crate::presentation::router::posts_router_generic;

    struct Harness {
        app: Router,
        users: MemoryUserRepository,
        posts: MemoryPostRepository,
        tokens: TokenService,
        _files: tempfile::TempDir,
    }

    fn harness() -> Harness {
        let files = tempfile::tempdir().unwrap();
        std::fs::write(files.path().join("sample.txt"), b"served").unwrap();

        let auth_config = Arc::new(AuthConfig::with_random_secret());
        let users = MemoryUserRepository::new();
        let posts = MemoryPostRepository::with_users(users.clone());
        let app = posts_router_generic(
            posts.clone(),
            Arc::new(users.clone()),
            Arc::new(MemoryBlobStore::new()),
            Arc::new(RecordingMailer::new()),
            auth_config.clone(),
            Arc::new(PostsConfig::default()),
            Some(files.path().to_path_buf()),
        );

        Harness {
            app,
            users,
            posts,
            tokens: TokenService::new(auth_config),
            _files: files,
        }
    }

    impl Harness {
        fn bearer(&self, user: &User) -> String {
            format!("Bearer {}", self.tokens.issue(&user.user_id).token)
        }

        fn seed(&self, email: &str, role: UserRole) -> User {
            let user = fixtures::user(email, "Zadar", role, true);
            self.users.insert(user.clone());
            user
        }

        async fn send(&self, request: Request<Body>) -> axum::response::Response {
            self.app.clone().oneshot(request).await.unwrap()
        }
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn with_json(method: &str, uri: &str, bearer: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, bearer)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn authed(method: &str, uri: &str, bearer: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, bearer)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_and_fetch_over_http() {
        let h = harness();
        let citizen = h.seed("c@example.org", UserRole::User);

        let response = h
            .send(with_json(
                "POST",
                "/create",
                &h.bearer(&citizen),
                json!({"title": "Pothole", "description": "Big one", "city": "Zadar"}),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let post_id = json_body(response).await["postId"].as_str().unwrap().to_string();

        let response = h
            .send(Request::get(format!("/{post_id}")).body(Body::empty()).unwrap())
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["title"], "Pothole");
        assert_eq!(body["status"], "sent");
        assert_eq!(body["verified"], false);
    }

    #[tokio::test]
    async fn test_create_requires_bearer() {
        let h = harness();
        let response = h
            .send(
                Request::post("/create")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(json!({"title": "t", "description": "d", "city": "c"}).to_string()))
                    .unwrap(),
            )
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_malformed_id_is_not_found() {
        let h = harness();
        let response = h
            .send(Request::get("/not-a-uuid").body(Body::empty()).unwrap())
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_vote_messages() {
        let h = harness();
        let citizen = h.seed("c@example.org", UserRole::User);
        let post = fixtures::post(&citizen, "Pothole", 0);
        h.posts.insert(&post).await.unwrap();
        let bearer = h.bearer(&citizen);

        let up = h
            .send(authed("PUT", &format!("/upvote/{}", post.post_id), &bearer))
            .await;
        assert_eq!(up.status(), StatusCode::OK);
        assert_eq!(json_body(up).await["message"], "added upvote");

        let down = h
            .send(authed("PUT", &format!("/downvote/{}", post.post_id), &bearer))
            .await;
        assert_eq!(
            json_body(down).await["message"],
            "added downvote and removed upvote"
        );

        let fav = h
            .send(authed("PUT", &format!("/favourite/{}", post.post_id), &bearer))
            .await;
        assert_eq!(json_body(fav).await["message"], "added to favourites");

        let favourites = h.send(authed("GET", "/favourites", &bearer)).await;
        assert_eq!(json_body(favourites).await.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_voting_needs_user_role() {
        let h = harness();
        let moderator = h.seed("m@example.org", UserRole::Moderator);
        let post = fixtures::post(&moderator, "Pothole", 0);
        h.posts.insert(&post).await.unwrap();

        let response = h
            .send(authed(
                "PUT",
                &format!("/upvote/{}", post.post_id),
                &h.bearer(&moderator),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_approval_and_status_roles() {
        let h = harness();
        let citizen = h.seed("c@example.org", UserRole::User);
        let moderator = h.seed("m@example.org", UserRole::Moderator);
        let admin = h.seed("a@example.org", UserRole::LocalAdmin);
        let post = fixtures::post(&citizen, "Pothole", 0);
        h.posts.insert(&post).await.unwrap();

        let by_citizen = h
            .send(authed("PUT", &format!("/approve/{}", post.post_id), &h.bearer(&citizen)))
            .await;
        assert_eq!(by_citizen.status(), StatusCode::FORBIDDEN);

        let queue = h.send(authed("GET", "/unverified", &h.bearer(&moderator))).await;
        assert_eq!(json_body(queue).await.as_array().unwrap().len(), 1);

        let approved = h
            .send(authed("PUT", &format!("/approve/{}", post.post_id), &h.bearer(&moderator)))
            .await;
        assert_eq!(approved.status(), StatusCode::OK);

        let bad_status = h
            .send(with_json(
                "PUT",
                "/status",
                &h.bearer(&admin),
                json!({"id": post.post_id.to_string(), "status": "closed"}),
            ))
            .await;
        assert_eq!(bad_status.status(), StatusCode::BAD_REQUEST);

        let status = h
            .send(with_json(
                "PUT",
                "/status",
                &h.bearer(&admin),
                json!({"id": post.post_id.to_string(), "status": "in-progress"}),
            ))
            .await;
        assert_eq!(status.status(), StatusCode::OK);

        let city = h
            .send(Request::get("/city/Zadar?sort=in-progress").body(Body::empty()).unwrap())
            .await;
        let body = json_body(city).await;
        assert_eq!(body[0]["status"], "in-progress");
    }

    #[tokio::test]
    async fn test_list_all_pagination_query() {
        let h = harness();
        let citizen = h.seed("c@example.org", UserRole::User);
        for i in 0..5 {
            let mut post = fixtures::post(&citizen, &format!("Report {i}"), i);
            post.verified = true;
            h.posts.insert(&post).await.unwrap();
        }

        let response = h
            .send(Request::get("/all?page=2&limit=2").body(Body::empty()).unwrap())
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["posts"].as_array().unwrap().len(), 2);
        assert_eq!(body["next"], json!({"page": 3, "limit": 2}));
        assert_eq!(body["previous"], json!({"page": 1, "limit": 2}));

        let half = h
            .send(Request::get("/all?page=2").body(Body::empty()).unwrap())
            .await;
        assert_eq!(half.status(), StatusCode::BAD_REQUEST);

        let bad_sort = h
            .send(Request::get("/all?sort=random").body(Body::empty()).unwrap())
            .await;
        assert_eq!(bad_sort.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delete_by_stranger_is_forbidden() {
        let h = harness();
        let owner = h.seed("o@example.org", UserRole::User);
        let stranger = h.seed("s@example.org", UserRole::User);
        let post = fixtures::post(&owner, "Pothole", 0);
        h.posts.insert(&post).await.unwrap();

        let response = h
            .send(authed("DELETE", &format!("/{}", post.post_id), &h.bearer(&stranger)))
            .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = h
            .send(authed("DELETE", &format!("/{}", post.post_id), &h.bearer(&owner)))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(h.posts.is_empty());
    }

    #[tokio::test]
    async fn test_upload_files_multipart() {
        let h = harness();
        let owner = h.seed("o@example.org", UserRole::User);
        let post = fixtures::post(&owner, "Pothole", 0);
        h.posts.insert(&post).await.unwrap();

        let boundary = "X-CIVIC-BOUNDARY";
        let body = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"files\"; filename=\"hole.jpg\"\r\n\
             Content-Type: image/jpeg\r\n\r\n\
             jpeg-bytes\r\n\
             --{boundary}--\r\n"
        );
        let request = Request::post(format!("/create/files/{}", post.post_id))
            .header(header::AUTHORIZATION, h.bearer(&owner))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();

        let response = h.send(request).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        let expected = format!("memory://{}_0_hole.jpg", post.post_id);
        assert_eq!(body["fileUrls"], json!([expected]));
    }

    #[tokio::test]
    async fn test_local_files_are_served() {
        let h = harness();
        let response = h
            .send(Request::get("/get-file/sample.txt").body(Body::empty()).unwrap())
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"served");
    }

    #[tokio::test]
    async fn test_id_documents_not_served_with_post_files() {
        let post_files = tempfile::tempdir().unwrap();
        let id_files = tempfile::tempdir().unwrap();
        let auth_config = Arc::new(AuthConfig::with_random_secret());
        let users = MemoryUserRepository::new();
        let posts = MemoryPostRepository::with_users(users.clone());

        let app = Router::new()
            .nest(
                "/users",
                users_router_generic(
                    users.clone(),
                    Arc::new(FsBlobStore::new(
                        id_files.path(),
                        "http://localhost/users/id-documents",
                    )),
                    auth_config.clone(),
                ),
            )
            .nest(
                "/posts",
                posts_router_generic(
                    posts,
                    Arc::new(users.clone()),
                    Arc::new(FsBlobStore::new(
                        post_files.path(),
                        "http://localhost/posts/get-file",
                    )),
                    Arc::new(RecordingMailer::new()),
                    auth_config.clone(),
                    Arc::new(PostsConfig::default()),
                    Some(post_files.path().to_path_buf()),
                ),
            );
        let tokens = TokenService::new(auth_config);

        let citizen = fixtures::user("id@example.org", "Zadar", UserRole::User, false);
        let moderator = fixtures::user("mod@example.org", "Zadar", UserRole::Moderator, true);
        users.insert(citizen.clone());
        users.insert(moderator.clone());

        let boundary = "civic-boundary";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"idPic\"; filename=\"passport.jpg\"\r\n\
             Content-Type: image/jpeg\r\n\r\nsecret-scan\r\n--{b}--\r\n",
            b = boundary
        );
        let response = app
            .clone()
            .oneshot(
                Request::post("/users/register/id")
                    .header(
                        header::AUTHORIZATION,
                        format!("Bearer {}", tokens.issue(&citizen.user_id).token),
                    )
                    .header(
                        header::CONTENT_TYPE,
                        format!("multipart/form-data; boundary={}", boundary),
                    )
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let id_url = json_body(response).await["idUrl"].as_str().unwrap().to_string();
        let key = format!("id_{}_passport.jpg", citizen.user_id);
        assert_eq!(id_url, format!("http://localhost/users/id-documents/{key}"));
        assert!(!post_files.path().join(&key).exists());

        let public = app
            .clone()
            .oneshot(
                Request::get(format!("/posts/get-file/{key}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(public.status(), StatusCode::NOT_FOUND);

        let moderated = app
            .clone()
            .oneshot(
                Request::get(format!("/users/id-documents/{key}"))
                    .header(
                        header::AUTHORIZATION,
                        format!("Bearer {}", tokens.issue(&moderator.user_id).token),
                    )
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(moderated.status(), StatusCode::OK);
        let bytes = to_bytes(moderated.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"secret-scan");
    }
}
