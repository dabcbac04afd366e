mod common;

use renovo::{
    domain::{
        budget::{CreateBudgetItem, UpdateBudgetItem},
        milestone::CreateMilestone,
        task::{CreateTask, UpdateTask},
        BudgetAlert, TaskStatus,
    },
    ServiceError,
};
use chrono::NaiveDate;

fn item(category: &str, estimated: f64, actual: f64) -> CreateBudgetItem {
    CreateBudgetItem {
        category: category.into(),
        description: format!("{category} work"),
        estimated_cost: estimated,
        actual_cost: actual,
    }
}

#[tokio::test]
async fn new_project_has_empty_budget() {
    let env = common::setup().await;
    let owner = common::user(&env.services, "alice").await;
    let project = common::project(&env.services, &owner, "Loft").await;

    let budget = env.services.budget.get(project.id).await.unwrap();
    assert_eq!(budget.budget.currency, "EUR");
    assert_eq!(budget.budget.total_estimated, 0.0);
    assert_eq!(budget.budget.total_actual, 0.0);
    assert_eq!(budget.variance_percent, None);
    assert_eq!(budget.alert, BudgetAlert::None);
}

#[tokio::test]
async fn totals_follow_items_and_priced_tasks() {
    let env = common::setup().await;
    let owner = common::user(&env.services, "alice").await;
    let project = common::project(&env.services, &owner, "Kitchen").await;
    let services = &env.services;

    let tiles = services
        .budget
        .add_item(project.id, item("tiling", 1000.0, 1050.0))
        .await
        .unwrap();
    let budget = services.budget.get(project.id).await.unwrap();
    assert_eq!(budget.budget.total_estimated, 1000.0);
    assert_eq!(budget.budget.total_actual, 1050.0);
    assert_eq!(budget.variance_percent, Some(5.0));
    assert_eq!(budget.alert, BudgetAlert::None);

    // unpriced tasks do not touch the budget
    services
        .tasks
        .create(project.id, CreateTask::titled("Pick grout colour"))
        .await
        .unwrap();

    let plumbing = services
        .tasks
        .create(
            project.id,
            CreateTask {
                estimated_price: Some(500.0),
                actual_price: Some(700.0),
                ..CreateTask::titled("Move sink")
            },
        )
        .await
        .unwrap();
    let budget = services.budget.get(project.id).await.unwrap();
    assert_eq!(budget.budget.items_estimated, 1000.0);
    assert_eq!(budget.budget.tasks_estimated, 500.0);
    assert_eq!(budget.budget.total_estimated, 1500.0);
    assert_eq!(budget.budget.total_actual, 1750.0);
    assert_eq!(budget.variance_percent, Some(16.67));
    assert_eq!(budget.alert, BudgetAlert::Warning);
    assert_eq!(budget.remaining, -250.0);

    services
        .budget
        .update_item(
            tiles.id,
            UpdateBudgetItem {
                actual_cost: Some(1400.0),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let budget = services.budget.get(project.id).await.unwrap();
    assert_eq!(budget.budget.total_actual, 2100.0);
    assert_eq!(budget.alert, BudgetAlert::Critical);

    // cancelled tasks drop out of the totals
    services
        .tasks
        .update(
            plumbing.id,
            UpdateTask {
                status: Some(TaskStatus::Cancelled),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let budget = services.budget.get(project.id).await.unwrap();
    assert_eq!(budget.budget.tasks_estimated, 0.0);
    assert_eq!(budget.budget.total_estimated, 1000.0);
    assert_eq!(budget.budget.total_actual, 1400.0);
    assert_eq!(budget.variance_percent, Some(40.0));

    services.budget.delete_item(tiles.id).await.unwrap();
    let budget = services.budget.get(project.id).await.unwrap();
    assert_eq!(budget.budget.total_estimated, 0.0);
    assert_eq!(budget.budget.total_actual, 0.0);
    assert_eq!(budget.alert, BudgetAlert::None);
}

#[tokio::test]
async fn clearing_and_deleting_task_prices_recomputes() {
    let env = common::setup().await;
    let owner = common::user(&env.services, "bob").await;
    let project = common::project(&env.services, &owner, "Bathroom").await;
    let services = &env.services;

    let task = services
        .tasks
        .create(
            project.id,
            CreateTask {
                estimated_price: Some(300.0),
                ..CreateTask::titled("Install vanity")
            },
        )
        .await
        .unwrap();
    assert_eq!(services.budget.get(project.id).await.unwrap().budget.total_estimated, 300.0);

    services
        .tasks
        .update(
            task.id,
            UpdateTask {
                estimated_price: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(services.budget.get(project.id).await.unwrap().budget.total_estimated, 0.0);

    services
        .tasks
        .update(
            task.id,
            UpdateTask {
                actual_price: Some(Some(120.5)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let budget = services.budget.get(project.id).await.unwrap();
    assert_eq!(budget.budget.total_actual, 120.5);
    // actual spend without any estimate has no variance
    assert_eq!(budget.variance_percent, None);

    services.tasks.delete(task.id).await.unwrap();
    let budget = services.budget.recalculate(project.id).await.unwrap();
    assert_eq!(budget.budget.total_actual, 0.0);
}

#[tokio::test]
async fn items_are_listed_and_validated() {
    let env = common::setup().await;
    let owner = common::user(&env.services, "carol").await;
    let project = common::project(&env.services, &owner, "Garage").await;
    let services = &env.services;

    services.budget.add_item(project.id, item("permits", 150.0, 0.0)).await.unwrap();
    services.budget.add_item(project.id, item("electrical", 900.0, 0.0)).await.unwrap();

    let items = services.budget.list_items(project.id).await.unwrap();
    let categories: Vec<_> = items.iter().map(|i| i.category.as_str()).collect();
    assert_eq!(categories, ["electrical", "permits"]);

    let negative = services.budget.add_item(project.id, item("paint", -5.0, 0.0)).await;
    assert!(matches!(negative, Err(ServiceError::Validation(_))));

    let blank = services.budget.add_item(project.id, item(" ", 5.0, 0.0)).await;
    assert!(matches!(blank, Err(ServiceError::Validation(_))));

    let owner_of_item = services.budget.item_project(items[0].id).await.unwrap();
    assert_eq!(owner_of_item, project.id);
}

#[tokio::test]
async fn tasks_cannot_use_foreign_milestones() {
    let env = common::setup().await;
    let owner = common::user(&env.services, "dave").await;
    let first = common::project(&env.services, &owner, "Attic").await;
    let second = common::project(&env.services, &owner, "Porch").await;
    let services = &env.services;

    let milestone = services
        .milestones
        .create(
            first.id,
            CreateMilestone {
                title: "Framing".into(),
                description: None,
                due_date: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
                position: None,
            },
        )
        .await
        .unwrap();

    let result = services
        .tasks
        .create(
            second.id,
            CreateTask {
                milestone_id: Some(milestone.id),
                estimated_price: Some(10.0),
                ..CreateTask::titled("Joists")
            },
        )
        .await;
    assert!(matches!(result, Err(ServiceError::Validation(_))));

    // the rejected task left no trace in the budget
    let budget = services.budget.get(second.id).await.unwrap();
    assert_eq!(budget.budget.total_estimated, 0.0);
}

#[tokio::test]
async fn deleting_a_project_removes_its_budget() {
    let env = common::setup().await;
    let owner = common::user(&env.services, "erin").await;
    let project = common::project(&env.services, &owner, "Shed").await;
    env.services.budget.add_item(project.id, item("roof", 400.0, 0.0)).await.unwrap();

    env.services.projects.delete(project.id).await.unwrap();

    assert!(matches!(
        env.services.budget.get(project.id).await,
        Err(ServiceError::NotFound(_))
    ));
    assert!(env.services.budget.list_items(project.id).await.unwrap().is_empty());
}
