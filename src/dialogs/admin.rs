//! Administrator console
//!
//! Lets admins browse the catalog, create, edit and delete services, and
//! download the appointments booked between two dates. Editing reuses the
//! creation steps with a "keep previous value" button on every question.

use async_trait::async_trait;
use tracing::{error, info, warn};
use crate::dialog::{Registry, StepConfig, StepDialog, StepHandler, Turn, Validation};
use crate::models::{AgeCategory, ServiceDraft};
use crate::services::{appointments_csv, InlineButton, Keyboard, Services};
use crate::state::Context;
use crate::utils::errors::{ConsultBotError, Result};
use crate::utils::helpers::{escape_html, format_user_date, parse_numeric_callback, parse_user_date};
use crate::utils::logging;
use super::{age_category_buttons, age_category_keyboard, service_buttons};

pub const DIALOG: &str = "admin_services";
pub const ENTRY_STEP: &str = "my_services";

pub const NEW_SERVICE: &str = "new_service";
pub const GET_STATISTICS: &str = "get_statistics";
pub const EDIT_SERVICE: &str = "edit_service";
pub const DELETE_SERVICE: &str = "delete_service";
pub const BACK: &str = "back";
pub const SAVE_PREVIOUS: &str = "save_previous";
pub const IS_LINK: &str = "True";
pub const IS_RECORD: &str = "False";

const INVALID_DATE: &str = "Неверный формат даты. Введите корректную дату.";
const INVALID_LINK: &str = "Ошибка. Пришлите верную ссылку.";
const SERVICE_SAVED: &str = "Услуга сохранена успешно";
const SERVICE_NOT_SAVED: &str = "Ошибка сохранения услуги";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminStep {
    MyServices,
    AskServiceName,
    AskSinceDate,
    ShowServiceCard,
    AskDescription,
    AskAgeCategory,
    AskIsLink,
    ReceiveIsLink,
    ReceiveLink,
    DeleteService,
    AskNewServiceName,
    AskNewDescription,
    AskNewAgeCategory,
    AskNewIsLink,
    ReceiveNewIsLink,
    ReceiveNewLink,
    AskUntilDate,
    SendStatistics,
}

pub fn registry() -> Registry<AdminStep> {
    Registry::new(DIALOG)
        .step(ENTRY_STEP, AdminStep::MyServices)
        .branch(
            "my_services_waiting_callback",
            vec![
                (NEW_SERVICE, AdminStep::AskServiceName),
                (GET_STATISTICS, AdminStep::AskSinceDate),
                ("", AdminStep::ShowServiceCard),
            ],
        )
        .step("set_description", AdminStep::AskDescription)
        .step("set_age_category", AdminStep::AskAgeCategory)
        .step("is_link", AdminStep::AskIsLink)
        .step("waiting_for_is_link", AdminStep::ReceiveIsLink)
        .step("waiting_for_link", AdminStep::ReceiveLink)
        .branch(
            "edit_delete_service",
            vec![
                (DELETE_SERVICE, AdminStep::DeleteService),
                (EDIT_SERVICE, AdminStep::AskNewServiceName),
                (BACK, AdminStep::MyServices),
                ("", AdminStep::MyServices),
            ],
        )
        .step("set_new_description", AdminStep::AskNewDescription)
        .step("set_new_age_category", AdminStep::AskNewAgeCategory)
        .step("new_is_link", AdminStep::AskNewIsLink)
        .step("new_waiting_for_is_link", AdminStep::ReceiveNewIsLink)
        .step("new_waiting_for_link", AdminStep::ReceiveNewLink)
        .step("waiting_for_date", AdminStep::AskUntilDate)
        .step("sending_statistics", AdminStep::SendStatistics)
}

pub fn dialog() -> StepDialog<AdminStep> {
    StepDialog::new(registry(), ENTRY_STEP).admin_only()
}

fn save_previous(label: &str) -> InlineButton {
    InlineButton::callback(SAVE_PREVIOUS, label)
}

fn link_choice_keyboard() -> Keyboard {
    Keyboard::Inline(vec![
        InlineButton::callback(IS_LINK, "Услуга-ссылка"),
        InlineButton::callback(IS_RECORD, "услуга-запись"),
    ])
}

fn is_category(callback: Option<&str>) -> bool {
    callback.and_then(AgeCategory::from_name).is_some()
}

fn is_link_choice(callback: Option<&str>) -> bool {
    matches!(callback, Some(IS_LINK) | Some(IS_RECORD))
}

fn is_url(text: Option<&str>) -> bool {
    text.map(|text| url::Url::parse(text).is_ok()).unwrap_or(false)
}

/// Service fields accumulated in the context
fn draft_from_context(context: &Context) -> Result<ServiceDraft> {
    let age_category = context
        .get_str("age_category")
        .and_then(AgeCategory::from_name)
        .ok_or_else(|| ConsultBotError::InvalidInput("Missing context field: age_category".to_string()))?;
    Ok(ServiceDraft {
        age_category,
        name: context.require_str("name")?.to_string(),
        description: context.require_str("description")?.to_string(),
        is_link: context.get_bool("is_link").unwrap_or(false),
        link: context.get_str("link").map(str::to_string),
    })
}

/// Create the service, or update it when the context comes from an edit
async fn save_service(turn: &Turn<AdminStep>, services: &Services) -> &'static str {
    let result = async {
        let draft = draft_from_context(&turn.context)?;
        match turn.context.get_id("service_id") {
            Some(id) => services.catalog.update_service(id, &draft).await,
            None => services.catalog.create_service(&draft).await,
        }
    }
    .await;

    match result {
        Ok(service) => {
            logging::log_admin_action(turn.user.id, "save_service", Some(&service.id.to_string()));
            SERVICE_SAVED
        }
        Err(e) => {
            error!(admin_id = turn.user.id, error = %e, "Failed to save service");
            SERVICE_NOT_SAVED
        }
    }
}

/// Handle the link/record choice shared by creation and editing
async fn receive_link_choice(turn: &mut Turn<AdminStep>, services: &Services) -> Result<bool> {
    let is_link = turn.callback_is(IS_LINK);
    turn.context.set("is_link", is_link)?;

    if is_link {
        turn.text = "Введите ссылку".to_string();
        turn.carry_context();
    } else {
        turn.context.set("link", Option::<String>::None)?;
        turn.text = save_service(turn, services).await.to_string();
        turn.redirect(AdminStep::MyServices);
    }
    Ok(is_link)
}

fn service_card(context: &Context) -> String {
    let category = context
        .get_str("age_category")
        .and_then(AgeCategory::from_name)
        .map(AgeCategory::label)
        .unwrap_or_default();
    let mut text = format!(
        "<b>Название услуги:</b> {}\n<b>Описание:</b>\n{}\n<b>Возрастная категория:</b>{}",
        escape_html(context.get_str("name").unwrap_or_default()),
        escape_html(context.get_str("description").unwrap_or_default()),
        category,
    );
    if context.get_bool("is_link").unwrap_or(false) {
        if let Some(link) = context.get_str("link") {
            text.push_str(&format!("\n<b>Ссылка:</b>\n{}", escape_html(link)));
        }
    }
    text
}

#[async_trait]
impl StepHandler for AdminStep {
    fn config(&self) -> StepConfig {
        match self {
            AdminStep::MyServices => StepConfig {
                text: "Список ваших услуг",
                next_state: Some("my_services_waiting_callback"),
                ..StepConfig::default()
            },
            AdminStep::AskServiceName => StepConfig {
                text: "Введите название услуги",
                ..StepConfig::default()
            },
            AdminStep::AskSinceDate => StepConfig {
                text: "Введите дату, с которой выгрузить список заявок. Формат даты: DD.MM.YYYY. Например: 01.01.2024",
                next_state: Some("waiting_for_date"),
                ..StepConfig::default()
            },
            AdminStep::ShowServiceCard => StepConfig {
                invalid_message: "Ошибка. Выберите пункт из меню.",
                next_state: Some("edit_delete_service"),
                keyboard: Keyboard::Inline(vec![
                    InlineButton::callback(EDIT_SERVICE, "Редактировать"),
                    InlineButton::callback(DELETE_SERVICE, "Удалить"),
                    InlineButton::callback(BACK, "Назад"),
                ]),
                ..StepConfig::default()
            },
            AdminStep::AskDescription => StepConfig {
                text: "Введите описание услуги",
                invalid_message: "Ошибка. Введите правильно название услуги",
                ..StepConfig::default()
            },
            AdminStep::AskAgeCategory => StepConfig {
                text: "Для какой возрастной категории услуга?",
                invalid_message: "Ошибка. Пожалуйста, введите описание.",
                keyboard: age_category_keyboard(),
                ..StepConfig::default()
            },
            AdminStep::AskIsLink => StepConfig {
                text: "Услуга-ссылка или услуга-запись?",
                invalid_message: "Похоже, вы не выбрали возрастную категорию. Пожалуйста выберите.",
                keyboard: link_choice_keyboard(),
                ..StepConfig::default()
            },
            AdminStep::ReceiveIsLink => StepConfig::default(),
            AdminStep::ReceiveLink => StepConfig {
                invalid_message: INVALID_LINK,
                ..StepConfig::default()
            },
            AdminStep::DeleteService => StepConfig::default(),
            AdminStep::AskNewServiceName => StepConfig {
                keyboard: Keyboard::Inline(vec![save_previous("Сохранить прежнее название")]),
                ..AdminStep::AskServiceName.config()
            },
            AdminStep::AskNewDescription => StepConfig {
                invalid_message: "Ошибка. Введите название услуги.",
                keyboard: Keyboard::Inline(vec![save_previous("Сохранить прежнее описание")]),
                ..AdminStep::AskDescription.config()
            },
            AdminStep::AskNewAgeCategory => {
                let mut buttons = age_category_buttons();
                buttons.push(save_previous("Сохранить прежнюю возрастную категорию"));
                StepConfig {
                    invalid_message: "Ошибка. Введите описание.",
                    keyboard: Keyboard::Inline(buttons),
                    ..AdminStep::AskAgeCategory.config()
                }
            }
            AdminStep::AskNewIsLink => AdminStep::AskIsLink.config(),
            AdminStep::ReceiveNewIsLink => AdminStep::ReceiveIsLink.config(),
            AdminStep::ReceiveNewLink => AdminStep::ReceiveLink.config(),
            AdminStep::AskUntilDate => StepConfig {
                text: "Введите дату, до которой выгрузить список заявок.",
                invalid_message: INVALID_DATE,
                ..StepConfig::default()
            },
            AdminStep::SendStatistics => StepConfig {
                text: "Теперь вы можете скачать документ.",
                invalid_message: INVALID_DATE,
                ..StepConfig::default()
            },
        }
    }

    fn validate(&self, turn: &Turn<Self>) -> Validation {
        let callback = turn.callback.as_deref();
        let keeps_previous = turn.callback_is(SAVE_PREVIOUS);
        match self {
            AdminStep::MyServices
            | AdminStep::AskServiceName
            | AdminStep::AskSinceDate
            | AdminStep::DeleteService
            | AdminStep::AskNewServiceName => Validation::Valid,
            AdminStep::ShowServiceCard => self.accept_if(callback.and_then(parse_numeric_callback).is_some()),
            AdminStep::AskDescription => self.accept_if(callback.is_none() && turn.text_answer().is_some()),
            AdminStep::AskAgeCategory => self.accept_if(turn.text_answer().is_some()),
            AdminStep::AskIsLink => self.accept_if(is_category(callback)),
            AdminStep::ReceiveIsLink | AdminStep::ReceiveNewIsLink => self.accept_if(is_link_choice(callback)),
            AdminStep::ReceiveLink => self.accept_if(is_url(turn.text_answer())),
            AdminStep::AskNewDescription | AdminStep::AskNewAgeCategory => {
                self.accept_if(keeps_previous || turn.text_answer().is_some())
            }
            AdminStep::AskNewIsLink => self.accept_if(keeps_previous || is_category(callback)),
            AdminStep::ReceiveNewLink => {
                let previous_link = turn.context.get_str("link").is_some();
                self.accept_if((keeps_previous && previous_link) || is_url(turn.text_answer()))
            }
            AdminStep::AskUntilDate | AdminStep::SendStatistics => {
                self.accept_if(turn.text_answer().and_then(parse_user_date).is_some())
            }
        }
    }

    async fn business_logic(&self, turn: &mut Turn<Self>, services: &Services) -> Result<Validation> {
        let answer = turn.text_answer().map(str::to_string);
        let keeps_previous = turn.callback_is(SAVE_PREVIOUS);

        match self {
            AdminStep::MyServices => match services.catalog.list_services().await {
                Ok(list) => {
                    let mut buttons = service_buttons(&list);
                    buttons.push(InlineButton::callback(NEW_SERVICE, "Добавить новую"));
                    buttons.push(InlineButton::callback(GET_STATISTICS, "Выгрузить список заявок"));
                    turn.keyboard = Keyboard::Inline(buttons);
                }
                Err(e) => {
                    error!(admin_id = turn.user.id, error = %e, "Failed to list services");
                    return Ok(self.reject());
                }
            },
            AdminStep::AskServiceName => {}
            AdminStep::AskSinceDate => match services.appointments.earliest_date().await {
                Ok(Some(date)) => turn.keyboard = Keyboard::reply(format_user_date(date)),
                Ok(None) => {}
                Err(e) => warn!(admin_id = turn.user.id, error = %e, "Failed to look up earliest appointment"),
            },
            AdminStep::ShowServiceCard => {
                let Some(service_id) = turn.callback.as_deref().and_then(parse_numeric_callback) else {
                    return Ok(self.reject());
                };
                let Some(service) = services.catalog.get_service(service_id).await? else {
                    return Ok(self.reject());
                };

                let mut context = Context::new();
                context.set("service_id", service.id)?;
                context.set("name", &service.name)?;
                context.set("description", &service.description)?;
                context.set("age_category", service.age_category.name())?;
                context.set("is_link", service.is_link)?;
                context.set("link", &service.link)?;
                turn.text = service_card(&context);
                turn.set_context(context);
            }
            AdminStep::AskDescription => {
                let mut context = Context::new();
                context.set("name", answer)?;
                turn.set_context(context);
            }
            AdminStep::AskAgeCategory => {
                turn.context.set("description", answer)?;
                turn.carry_context();
            }
            AdminStep::AskIsLink => {
                turn.context.set("age_category", &turn.callback)?;
                turn.carry_context();
            }
            AdminStep::ReceiveIsLink => {
                receive_link_choice(turn, services).await?;
            }
            AdminStep::ReceiveLink => {
                turn.context.set("is_link", true)?;
                turn.context.set("link", answer)?;
                turn.text = save_service(turn, services).await.to_string();
                turn.redirect(AdminStep::MyServices);
            }
            AdminStep::DeleteService => {
                let deleted = match turn.context.get_id("service_id") {
                    Some(id) => services.catalog.delete_service(id).await.map(|_| id),
                    None => Err(ConsultBotError::InvalidInput("Missing context field: service_id".to_string())),
                };
                turn.text = match deleted {
                    Ok(id) => {
                        logging::log_admin_action(turn.user.id, "delete_service", Some(&id.to_string()));
                        "Услуга успешно удалена".to_string()
                    }
                    Err(e) => {
                        error!(admin_id = turn.user.id, error = %e, "Failed to delete service");
                        "Ошибка удаления услуги".to_string()
                    }
                };
                turn.redirect(AdminStep::MyServices);
            }
            AdminStep::AskNewServiceName => {
                let previous = escape_html(turn.context.get_str("name").unwrap_or_default());
                turn.notify_user(format!("<b>Прежнее название услуги:</b>\n{}", previous));
                turn.carry_context();
            }
            AdminStep::AskNewDescription => {
                if !keeps_previous {
                    turn.context.set("name", answer)?;
                }
                turn.carry_context();
                let previous = escape_html(turn.context.get_str("description").unwrap_or_default());
                turn.notify_user(format!("<b>Прежнее описание услуги:</b>\n{}", previous));
            }
            AdminStep::AskNewAgeCategory => {
                if !keeps_previous {
                    turn.context.set("description", answer)?;
                }
                turn.carry_context();
                let previous = turn
                    .context
                    .get_str("age_category")
                    .and_then(AgeCategory::from_name)
                    .map(AgeCategory::label)
                    .unwrap_or_default();
                turn.notify_user(format!("<b>Прежняя возрастная категория:</b>\n{}", previous));
            }
            AdminStep::AskNewIsLink => {
                if !keeps_previous {
                    turn.context.set("age_category", &turn.callback)?;
                }
                turn.carry_context();
            }
            AdminStep::ReceiveNewIsLink => {
                let is_link = receive_link_choice(turn, services).await?;
                if is_link && turn.context.get_str("link").is_some() {
                    turn.keyboard = Keyboard::Inline(vec![save_previous("Сохранить прежнюю ссылку")]);
                }
            }
            AdminStep::ReceiveNewLink => {
                turn.context.set("is_link", true)?;
                if !keeps_previous {
                    turn.context.set("link", answer)?;
                }
                turn.text = save_service(turn, services).await.to_string();
                turn.redirect(AdminStep::MyServices);
            }
            AdminStep::AskUntilDate => {
                let Some(since) = answer.as_deref().and_then(parse_user_date) else {
                    return Ok(self.reject());
                };
                turn.context.set("since_date", format_user_date(since))?;
                turn.carry_context();
                turn.keyboard = Keyboard::reply(format_user_date(services.clock.today()));
            }
            AdminStep::SendStatistics => {
                let Some(until) = answer.as_deref().and_then(parse_user_date) else {
                    return Ok(self.reject());
                };
                let export = async {
                    let since = turn
                        .context
                        .get_str("since_date")
                        .and_then(parse_user_date)
                        .ok_or_else(|| ConsultBotError::InvalidInput("Missing context field: since_date".to_string()))?;
                    let records = services.appointments.appointments_between(since, until).await?;
                    let document = appointments_csv(&records, &services.settings.export.file_name)?;
                    Ok::<_, ConsultBotError>((since, records.len(), document))
                }
                .await;

                match export {
                    Ok((since, count, document)) => {
                        let range = format!("{} - {}", format_user_date(since), format_user_date(until));
                        logging::log_admin_action(turn.user.id, "export_appointments", Some(&range));
                        info!(admin_id = turn.user.id, count = count, "Appointments exported");
                        turn.document = Some(document);
                    }
                    Err(e) => {
                        error!(admin_id = turn.user.id, error = %e, "Failed to build appointment export");
                        turn.text = "Ошибка создания документа".to_string();
                    }
                }
                turn.redirect(AdminStep::MyServices);
            }
        }
        Ok(Validation::Valid)
    }
}
