/// Integration tests for the domain services
///
/// Run with: cargo test --test service_tests

mod common;

use common::{
    board_orders, create_tasks, orders, setup_file_pool, setup_pool, setup_pool_with_system_boards,
    task_orders,
};
use taskboard_shared::db::pool::begin_write;
use taskboard_shared::models::board::{Board, SystemBoard};
use taskboard_shared::models::task::TaskMove;
use taskboard_shared::services::board::{BoardChanges, BoardService, NewBoard};
use taskboard_shared::services::task::{NewTask, TaskChanges, TaskService};
use taskboard_shared::services::user::{NewUser, UserChanges, UserService};
use taskboard_shared::services::ServiceError;
use taskboard_shared::store::{self, Condition};

fn new_board(name: &str) -> NewBoard {
    NewBoard {
        name: name.to_string(),
        is_closed: false,
    }
}

fn new_task(name: &str, board_id: &str) -> NewTask {
    NewTask {
        name: name.to_string(),
        board_id: Some(board_id.to_string()),
        ..Default::default()
    }
}

fn new_user(name: &str, password: &str) -> NewUser {
    NewUser {
        name: name.to_string(),
        password: password.to_string(),
        avatar: format!("{}.png", name),
    }
}

#[tokio::test]
async fn test_system_board_bootstrap_is_idempotent() {
    let pool = setup_pool().await;

    let mut tx = pool.begin().await.unwrap();
    assert_eq!(BoardService::new(&mut tx).create_system_boards().await.unwrap(), 4);
    tx.commit().await.unwrap();

    let mut tx = pool.begin().await.unwrap();
    assert_eq!(BoardService::new(&mut tx).create_system_boards().await.unwrap(), 0);
    tx.commit().await.unwrap();

    let mut conn = pool.acquire().await.unwrap();
    let system = store::count::<Board>(&mut conn, &Condition::all().eq("is_system", true))
        .await
        .unwrap();
    assert_eq!(system, 4);
    assert_eq!(
        board_orders(&mut conn).await,
        orders(&[("Icebox", 0), ("Todo", 1), ("Doing", 2), ("Done", 3)])
    );
}

#[tokio::test]
async fn test_bootstrap_after_user_board_uses_count_order() {
    let pool = setup_pool().await;
    let mut tx = pool.begin().await.unwrap();

    BoardService::new(&mut tx).create_board(new_board("Inbox")).await.unwrap();
    BoardService::new(&mut tx).create_system_boards().await.unwrap();

    assert_eq!(
        board_orders(&mut tx).await,
        orders(&[("Inbox", 0), ("Icebox", 1), ("Todo", 2), ("Doing", 3), ("Done", 4)])
    );
}

#[tokio::test]
async fn test_find_boards_default_order() {
    let pool = setup_pool_with_system_boards().await;
    let mut tx = pool.begin().await.unwrap();
    let mut boards = BoardService::new(&mut tx);

    boards.create_board(new_board("Review")).await.unwrap();
    let names: Vec<_> = boards
        .find_boards(&[])
        .await
        .unwrap()
        .into_iter()
        .map(|b| b.name)
        .collect();

    assert_eq!(names, vec!["Icebox", "Todo", "Doing", "Done", "Review"]);
}

#[tokio::test]
async fn test_find_missing_board() {
    let pool = setup_pool().await;
    let mut conn = pool.acquire().await.unwrap();

    let err = BoardService::new(&mut conn).find_board("nope").await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(ref msg) if msg == "Board nope"));
}

#[tokio::test]
async fn test_create_board_rejects_empty_and_duplicate_names() {
    let pool = setup_pool_with_system_boards().await;
    let mut tx = pool.begin().await.unwrap();
    let mut boards = BoardService::new(&mut tx);

    let err = boards.create_board(new_board("  ")).await.unwrap_err();
    assert!(matches!(err, ServiceError::BadRequest(_)));

    let err = boards.create_board(new_board("Todo")).await.unwrap_err();
    assert!(err.is_constraint_violation(), "unexpected error: {:?}", err);
}

#[tokio::test]
async fn test_update_board_with_stale_version() {
    let pool = setup_pool_with_system_boards().await;
    let mut tx = pool.begin().await.unwrap();
    let mut boards = BoardService::new(&mut tx);

    let board = boards.create_board(new_board("Review")).await.unwrap();
    let updated = boards
        .update_board(
            &board.id,
            BoardChanges {
                name: "Code Review".to_string(),
                is_closed: true,
                version: board.version,
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.version, 2);
    assert_eq!(updated.display_order, board.display_order);

    let err = boards
        .update_board(
            &board.id,
            BoardChanges {
                name: "Stale".to_string(),
                is_closed: false,
                version: board.version,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::OptimisticLockFailure(_)));
}

#[tokio::test]
async fn test_delete_board_cascades_tasks_to_icebox() {
    let pool = setup_pool_with_system_boards().await;
    let mut tx = pool.begin().await.unwrap();
    let icebox = SystemBoard::ICEBOX.id;

    let review = BoardService::new(&mut tx).create_board(new_board("Review")).await.unwrap();
    create_tasks(&mut tx, icebox, &["i1"]).await;
    create_tasks(&mut tx, &review.id, &["r1", "r2"]).await;

    BoardService::new(&mut tx).delete_board(&review.id).await.unwrap();

    assert_eq!(
        task_orders(&mut tx, icebox).await,
        orders(&[("i1", 1), ("r1", 2), ("r2", 3)])
    );
    let err = BoardService::new(&mut tx).find_board(&review.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn test_system_boards_cannot_be_deleted() {
    let pool = setup_pool_with_system_boards().await;
    let mut tx = pool.begin().await.unwrap();

    for system_board in SystemBoard::ALL {
        let err = BoardService::new(&mut tx)
            .delete_board(system_board.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::PreconditionInvalid(_)));
    }

    let err = BoardService::new(&mut tx).delete_board("nope").await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn test_reorder_boards_validates_ids() {
    let pool = setup_pool_with_system_boards().await;
    let mut tx = pool.begin().await.unwrap();
    let mut boards = BoardService::new(&mut tx);

    let dup = vec![SystemBoard::TODO.id.to_string(), SystemBoard::TODO.id.to_string()];
    assert!(matches!(
        boards.reorder_boards(&dup).await.unwrap_err(),
        ServiceError::BadRequest(_)
    ));

    let unknown = vec!["missing".to_string()];
    assert!(matches!(
        boards.reorder_boards(&unknown).await.unwrap_err(),
        ServiceError::NotFound(_)
    ));

    let reversed: Vec<String> = SystemBoard::ALL.iter().rev().map(|b| b.id.to_string()).collect();
    boards.reorder_boards(&reversed).await.unwrap();

    let names: Vec<_> = boards
        .find_boards(&[])
        .await
        .unwrap()
        .into_iter()
        .map(|b| (b.name, b.display_order))
        .collect();
    assert_eq!(names, orders(&[("Done", 0), ("Doing", 1), ("Todo", 2), ("Icebox", 3)]));
}

#[tokio::test]
async fn test_create_task_defaults_to_icebox() {
    let pool = setup_pool_with_system_boards().await;
    let mut tx = pool.begin().await.unwrap();

    let task = TaskService::new(&mut tx)
        .create_task(NewTask {
            name: "Triage".to_string(),
            estimate_size: 3,
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(task.board_id, SystemBoard::ICEBOX.id);
    assert_eq!(task.display_order, 1);
    assert_eq!(task.estimate_size, 3);
    assert_eq!(task.version, 1);
}

#[tokio::test]
async fn test_create_task_requires_existing_board_and_assignee() {
    let pool = setup_pool_with_system_boards().await;
    let mut tx = pool.begin().await.unwrap();
    let mut tasks = TaskService::new(&mut tx);

    let err = tasks.create_task(new_task("t", "missing")).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(ref msg) if msg == "Board missing"));

    let err = tasks
        .create_task(NewTask {
            assignee_user_id: Some("ghost".to_string()),
            ..new_task("t", SystemBoard::TODO.id)
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(ref msg) if msg == "User ghost"));
}

#[tokio::test]
async fn test_update_task_keeps_board_and_position() {
    let pool = setup_pool_with_system_boards().await;
    let mut tx = pool.begin().await.unwrap();
    let todo = SystemBoard::TODO.id;

    let user = UserService::new(&mut tx)
        .create_user(new_user("alice", "pw"))
        .await
        .unwrap();

    let mut tasks = TaskService::new(&mut tx);
    tasks.create_task(new_task("first", todo)).await.unwrap();
    let second = tasks.create_task(new_task("second", todo)).await.unwrap();

    let updated = tasks
        .update_task(
            &second.id,
            TaskChanges {
                name: "second (edited)".to_string(),
                description: "details".to_string(),
                assignee_user_id: Some(user.id.clone()),
                is_closed: true,
                estimate_size: 5,
                version: second.version,
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.board_id, todo);
    assert_eq!(updated.display_order, 2);
    assert_eq!(updated.assignee_user_id.as_deref(), Some(user.id.as_str()));
    assert_eq!(updated.version, 2);

    let err = tasks
        .update_task(
            &second.id,
            TaskChanges {
                name: "stale".to_string(),
                version: 1,
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::OptimisticLockFailure(_)));
}

#[tokio::test]
async fn test_find_board_tasks_in_position_order() {
    let pool = setup_pool_with_system_boards().await;
    let mut tx = pool.begin().await.unwrap();
    let todo = SystemBoard::TODO.id;

    let created = create_tasks(&mut tx, todo, &["a", "b", "c"]).await;
    let mut tasks = TaskService::new(&mut tx);
    tasks
        .move_task(&TaskMove {
            task_id: created[2].id.clone(),
            from_board_id: todo.to_string(),
            from_display_order: 3,
            to_board_id: todo.to_string(),
            to_display_order: 1,
        })
        .await
        .unwrap();

    let names: Vec<_> = tasks
        .find_board_tasks(todo)
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.name)
        .collect();
    assert_eq!(names, vec!["c", "a", "b"]);

    let err = tasks.find_board_tasks("missing").await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn test_move_task_errors() {
    let pool = setup_pool_with_system_boards().await;
    let mut tx = pool.begin().await.unwrap();
    let todo = SystemBoard::TODO.id;

    let created = create_tasks(&mut tx, todo, &["a"]).await;
    let mut tasks = TaskService::new(&mut tx);

    let to_missing_board = TaskMove {
        task_id: created[0].id.clone(),
        from_board_id: todo.to_string(),
        from_display_order: 1,
        to_board_id: "missing".to_string(),
        to_display_order: 1,
    };
    let err = tasks.move_task(&to_missing_board).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(ref msg) if msg == "Board missing"));

    let missing_task = TaskMove {
        task_id: "ghost".to_string(),
        to_board_id: SystemBoard::DONE.id.to_string(),
        ..to_missing_board.clone()
    };
    let err = tasks.move_task(&missing_task).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(ref msg) if msg == "Task ghost"));

    let zero = TaskMove {
        to_display_order: 0,
        to_board_id: todo.to_string(),
        ..to_missing_board
    };
    let err = tasks.move_task(&zero).await.unwrap_err();
    assert!(matches!(err, ServiceError::BadRequest(_)));
}

#[tokio::test]
async fn test_delete_task_leaves_gap() {
    let pool = setup_pool_with_system_boards().await;
    let mut tx = pool.begin().await.unwrap();
    let todo = SystemBoard::TODO.id;

    let created = create_tasks(&mut tx, todo, &["a", "b", "c"]).await;
    TaskService::new(&mut tx).delete_task(&created[1].id).await.unwrap();

    assert_eq!(task_orders(&mut tx, todo).await, orders(&[("a", 1), ("c", 3)]));

    let err = TaskService::new(&mut tx).delete_task(&created[1].id).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn test_login() {
    let pool = setup_pool().await;
    let mut tx = pool.begin().await.unwrap();
    let mut users = UserService::new(&mut tx);

    let alice = users.create_user(new_user("alice", "wonderland")).await.unwrap();

    let logged_in = users.login("alice", "wonderland").await.unwrap();
    assert_eq!(logged_in.id, alice.id);

    let wrong_password = users.login("alice", "looking-glass").await.unwrap_err();
    let unknown_user = users.login("bob", "wonderland").await.unwrap_err();

    assert!(matches!(wrong_password, ServiceError::Unauthenticated));
    assert!(matches!(unknown_user, ServiceError::Unauthenticated));
    assert_eq!(wrong_password.to_string(), unknown_user.to_string());
}

#[tokio::test]
async fn test_login_name_is_trimmed_like_on_create() {
    let pool = setup_pool().await;
    let mut tx = pool.begin().await.unwrap();
    let mut users = UserService::new(&mut tx);

    let alice = users.create_user(new_user("  alice ", "wonderland")).await.unwrap();
    assert_eq!(alice.name, "alice");

    let logged_in = users.login(" alice  ", "wonderland").await.unwrap();
    assert_eq!(logged_in.id, alice.id);
}

#[tokio::test]
async fn test_login_with_corrupt_hash_is_unauthenticated() {
    let pool = setup_pool().await;
    let mut tx = pool.begin().await.unwrap();

    let mut user = UserService::new(&mut tx)
        .create_user(new_user("mallory", "pw"))
        .await
        .unwrap();
    user.password_hash = "not-a-hash".to_string();
    store::update(&mut tx, &mut user).await.unwrap();

    let err = UserService::new(&mut tx).login("mallory", "pw").await.unwrap_err();
    assert!(matches!(err, ServiceError::Unauthenticated));
}

#[tokio::test]
async fn test_user_crud() {
    let pool = setup_pool().await;
    let mut tx = pool.begin().await.unwrap();
    let mut users = UserService::new(&mut tx);

    let carol = users.create_user(new_user("carol", "old")).await.unwrap();
    users.create_user(new_user("bob", "pw")).await.unwrap();

    let names: Vec<_> = users
        .find_users(&[])
        .await
        .unwrap()
        .into_iter()
        .map(|u| u.name)
        .collect();
    assert_eq!(names, vec!["bob", "carol"]);

    let err = users.create_user(new_user("bob", "again")).await.unwrap_err();
    assert!(err.is_constraint_violation());

    let updated = users
        .update_user(
            &carol.id,
            UserChanges {
                name: "carol".to_string(),
                password: Some("new".to_string()),
                avatar: "carol-2.png".to_string(),
                version: carol.version,
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.avatar, "carol-2.png");
    assert!(users.login("carol", "new").await.is_ok());
    assert!(users.login("carol", "old").await.is_err());

    users.delete_user(&carol.id).await.unwrap();
    assert!(matches!(
        users.find_user(&carol.id).await.unwrap_err(),
        ServiceError::NotFound(_)
    ));
}

#[tokio::test]
async fn test_delete_user_unassigns_tasks() {
    let pool = setup_pool_with_system_boards().await;
    let mut tx = pool.begin().await.unwrap();

    let dave = UserService::new(&mut tx)
        .create_user(new_user("dave", "pw"))
        .await
        .unwrap();
    let task = TaskService::new(&mut tx)
        .create_task(NewTask {
            assignee_user_id: Some(dave.id.clone()),
            ..new_task("assigned", SystemBoard::TODO.id)
        })
        .await
        .unwrap();

    UserService::new(&mut tx).delete_user(&dave.id).await.unwrap();

    let stored = TaskService::new(&mut tx).find_task(&task.id).await.unwrap();
    assert_eq!(stored.assignee_user_id, None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_board_creation_requests_all_succeed() {
    let (_dir, pool) = setup_file_pool(8).await;

    let requests = (0..8).map(|i| {
        let pool = pool.clone();
        tokio::spawn(async move {
            let mut tx = begin_write(&pool).await?;
            let board = BoardService::new(&mut tx)
                .create_board(new_board(&format!("Lane {}", i)))
                .await?;
            tx.commit().await?;
            Ok::<_, Box<dyn std::error::Error + Send + Sync>>(board.display_order)
        })
    });
    let results = futures::future::join_all(requests).await;

    let mut assigned = Vec::new();
    for result in results {
        match result.unwrap() {
            Ok(order) => assigned.push(order),
            Err(err) => panic!("concurrent create failed: {}", err),
        }
    }
    assigned.sort_unstable();
    assert_eq!(assigned, (4..12).collect::<Vec<i64>>());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_task_creation_requests_all_succeed() {
    let (_dir, pool) = setup_file_pool(8).await;

    let requests = (0..8).map(|i| {
        let pool = pool.clone();
        tokio::spawn(async move {
            let mut tx = begin_write(&pool).await?;
            let task = TaskService::new(&mut tx)
                .create_task(new_task(&format!("t{}", i), SystemBoard::DOING.id))
                .await?;
            tx.commit().await?;
            Ok::<_, Box<dyn std::error::Error + Send + Sync>>(task.display_order)
        })
    });
    let results = futures::future::join_all(requests).await;

    let mut assigned = Vec::new();
    for result in results {
        match result.unwrap() {
            Ok(order) => assigned.push(order),
            Err(err) => panic!("concurrent create failed: {}", err),
        }
    }
    assigned.sort_unstable();
    assert_eq!(assigned, (1..=8).collect::<Vec<i64>>());
}
