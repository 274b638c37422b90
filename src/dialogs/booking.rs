//! Consultation booking dialog
//!
//! Walks a client from the greeting through category and service choice to
//! a filled appointment form. Each registry key names the question the
//! client is answering when their next message arrives.

use async_trait::async_trait;
use tracing::{error, info, warn};
use crate::dialog::{Registry, StepConfig, StepDialog, StepHandler, Turn, Validation};
use crate::models::{AgeCategory, CreateAppointmentRequest};
use crate::services::{InlineButton, Keyboard, Services};
use crate::state::Context;
use crate::utils::errors::{ConsultBotError, Result};
use crate::utils::helpers::{appoint_callback, escape_html, parse_appoint_callback, parse_numeric_callback};
use super::{age_category_keyboard, service_buttons};

pub const DIALOG: &str = "user_services";
pub const ENTRY_STEP: &str = "start";
pub const MENU_STEP: &str = "menu";

pub const GET_CONSULTATION: &str = "get_consultation";
pub const AGREE: &str = "agree";

const MENU_TEXT: &str = "Здравствуйте!
Вы присоединились к боту записи на консультации.

Я помогу вам выбрать подходящую услугу и записаться на консультацию.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingStep {
    Menu,
    ChooseAgeCategory,
    ListServices,
    ShowService,
    AskName,
    AskProblem,
    AskRequest,
    AskPhone,
    AskAgreement,
    Appoint,
}

pub fn registry() -> Registry<BookingStep> {
    Registry::new(DIALOG)
        .step(ENTRY_STEP, BookingStep::Menu)
        .step(MENU_STEP, BookingStep::ChooseAgeCategory)
        .step("select_age_category", BookingStep::ListServices)
        .step("select_service", BookingStep::ShowService)
        .step("show_service", BookingStep::AskName)
        .step("what_is_name", BookingStep::AskProblem)
        .step("describe_problem", BookingStep::AskRequest)
        .step("describe_request", BookingStep::AskPhone)
        .step("set_phone_number", BookingStep::AskAgreement)
        .step("agreement", BookingStep::Appoint)
}

pub fn dialog() -> StepDialog<BookingStep> {
    StepDialog::new(registry(), ENTRY_STEP)
}

fn menu_keyboard() -> Keyboard {
    Keyboard::Inline(vec![InlineButton::callback(GET_CONSULTATION, "Начать")])
}

/// Store a typed answer under `key` and carry the form forward
fn save_answer(turn: &mut Turn<BookingStep>, key: &str) -> Result<()> {
    let answer = turn.text_answer().unwrap_or_default().to_string();
    turn.context.set(key, answer)?;
    turn.carry_context();
    Ok(())
}

/// Fields collected by the form
struct AppointmentForm {
    service_id: i32,
    name: String,
    problem: String,
    request: String,
    phone_number: String,
}

impl AppointmentForm {
    fn from_context(context: &Context) -> Result<Self> {
        let service_id = context.get_id("service_id").ok_or_else(|| {
            ConsultBotError::InvalidInput("Missing context field: service_id".to_string())
        })?;
        Ok(Self {
            service_id,
            name: context.require_str("name")?.to_string(),
            problem: context.require_str("problem")?.to_string(),
            request: context.require_str("request")?.to_string(),
            phone_number: context.require_str("phone_number")?.to_string(),
        })
    }

    fn summary(&self, username: Option<&str>) -> String {
        let alias = username
            .map(|username| format!("@{}", escape_html(username)))
            .unwrap_or_else(|| "не указан".to_string());
        format!(
            "<b>Поступила заявка на консультацию</b>\n<b>Имя клиента:</b> {}\n<b>Алиас:</b> {}\n<b>Описание проблемы:</b>\n{}\n<b>Запрос:</b>\n{}\n<b>Номер телефона:</b>\n{}",
            escape_html(&self.name),
            alias,
            escape_html(&self.problem),
            escape_html(&self.request),
            escape_html(&self.phone_number),
        )
    }
}

#[async_trait]
impl StepHandler for BookingStep {
    fn config(&self) -> StepConfig {
        match self {
            BookingStep::Menu => StepConfig {
                text: MENU_TEXT,
                next_state: Some(MENU_STEP),
                keyboard: menu_keyboard(),
                ..StepConfig::default()
            },
            BookingStep::ChooseAgeCategory => StepConfig {
                text: "Выберите возраст вашего ребёнка",
                keyboard: age_category_keyboard(),
                ..StepConfig::default()
            },
            BookingStep::ListServices => StepConfig {
                text: "Выберите проблему",
                invalid_message: "Похоже, вы не выбрали возрастную категорию. Пожалуйста выберите.",
                ..StepConfig::default()
            },
            BookingStep::ShowService => StepConfig {
                invalid_message: "Ошибка. Пожалуйста, выберите проблему.",
                ..StepConfig::default()
            },
            BookingStep::AskName => StepConfig {
                text: "Как Вас зовут?",
                invalid_message: "Чтобы записаться нажмите на кнопку \"записаться\", чтобы вернуться в начало нажмите /menu",
                ..StepConfig::default()
            },
            BookingStep::AskProblem => StepConfig {
                text: "Опишите Вашу проблему",
                invalid_message: "Ошибка. Пожалуйста, введите Ваше имя.",
                ..StepConfig::default()
            },
            BookingStep::AskRequest => StepConfig {
                text: "Опишите Ваш запрос. Каких результатов Вы хотели бы достичь?",
                invalid_message: "Ошибка. Пожалуйста, введите описание проблемы.",
                ..StepConfig::default()
            },
            BookingStep::AskPhone => StepConfig {
                text: "Напишите Ваш номер телефона",
                invalid_message: "Ошибка. Пожалуйста, опишите Ваш запрос.",
                ..StepConfig::default()
            },
            BookingStep::AskAgreement => StepConfig {
                text: "Я согласен(сна), что результат может быть достигнут только если соблюдать все рекомендации",
                invalid_message: "Ошибка. Пожалуйста, введите номер телефона.",
                keyboard: Keyboard::Inline(vec![InlineButton::callback(AGREE, "Согласен(сна)")]),
                ..StepConfig::default()
            },
            BookingStep::Appoint => StepConfig {
                text: "Ваша заявка принята, в ближайшее время я с Вами свяжусь",
                invalid_message: "Чтобы записаться дайте согласие, чтобы вернуться в начало нажмите /menu",
                next_state: Some(MENU_STEP),
                ..StepConfig::default()
            },
        }
    }

    fn validate(&self, turn: &Turn<Self>) -> Validation {
        let callback = turn.callback.as_deref();
        match self {
            BookingStep::Menu | BookingStep::ChooseAgeCategory => Validation::Valid,
            BookingStep::ListServices => self.accept_if(callback.and_then(AgeCategory::from_name).is_some()),
            BookingStep::ShowService => self.accept_if(callback.and_then(parse_numeric_callback).is_some()),
            BookingStep::AskName => self.accept_if(callback.and_then(parse_appoint_callback).is_some()),
            BookingStep::AskProblem
            | BookingStep::AskRequest
            | BookingStep::AskPhone
            | BookingStep::AskAgreement => self.accept_if(turn.text_answer().is_some()),
            BookingStep::Appoint => self.accept_if(turn.callback_is(AGREE)),
        }
    }

    async fn business_logic(&self, turn: &mut Turn<Self>, services: &Services) -> Result<Validation> {
        match self {
            BookingStep::Menu => {}
            BookingStep::ChooseAgeCategory => {
                if !turn.callback_is(GET_CONSULTATION) {
                    turn.text = MENU_TEXT.to_string();
                    turn.keyboard = menu_keyboard();
                    turn.goto(MENU_STEP);
                }
            }
            BookingStep::ListServices => {
                let Some(category) = turn.callback.as_deref().and_then(AgeCategory::from_name) else {
                    return Ok(self.reject());
                };
                match services.catalog.services_by_category(category).await {
                    Ok(list) if list.is_empty() => {
                        turn.text = "В этой категории пока нет услуг.".to_string();
                        turn.redirect(BookingStep::Menu);
                    }
                    Ok(list) => {
                        turn.keyboard = Keyboard::Inline(service_buttons(&list));
                        turn.set_context(Context::new());
                    }
                    Err(e) => {
                        error!(user_id = turn.user.id, category = category.name(), error = %e, "Failed to list services");
                        turn.text = "Ошибка!".to_string();
                        turn.redirect(BookingStep::Menu);
                    }
                }
            }
            BookingStep::ShowService => {
                let Some(service_id) = turn.callback.as_deref().and_then(parse_numeric_callback) else {
                    return Ok(self.reject());
                };
                let Some(service) = services.catalog.get_service(service_id).await? else {
                    warn!(user_id = turn.user.id, service_id = service_id, "Selected service no longer exists");
                    return Ok(self.reject());
                };

                turn.text = format!(
                    "<b>{}</b>\n<b>Описание:</b>\n{}\n<b>Возрастная категория: </b>{}",
                    escape_html(&service.name),
                    escape_html(&service.description),
                    service.age_category.label(),
                );
                match (service.is_link, service.link.as_deref()) {
                    (true, Some(link)) => {
                        turn.keyboard = Keyboard::Inline(vec![
                            InlineButton::link("перейти по ссылке", link),
                            InlineButton::callback(MENU_STEP, "Вернуться в меню"),
                        ]);
                        turn.goto(MENU_STEP);
                    }
                    _ => {
                        turn.keyboard = Keyboard::Inline(vec![InlineButton::callback(
                            appoint_callback(service.id),
                            "записаться",
                        )]);
                    }
                }
            }
            BookingStep::AskName => {
                let Some(service_id) = turn.callback.as_deref().and_then(parse_appoint_callback) else {
                    return Ok(self.reject());
                };
                turn.context.set("service_id", service_id)?;
                turn.carry_context();
            }
            BookingStep::AskProblem => save_answer(turn, "name")?,
            BookingStep::AskRequest => save_answer(turn, "problem")?,
            BookingStep::AskPhone => save_answer(turn, "request")?,
            BookingStep::AskAgreement => save_answer(turn, "phone_number")?,
            BookingStep::Appoint => {
                let form = AppointmentForm::from_context(&turn.context)?;
                let username = turn.user.username.clone();
                let summary = form.summary(username.as_deref());

                let request = CreateAppointmentRequest {
                    service_id: form.service_id,
                    client_name: form.name,
                    problem_description: form.problem,
                    request: form.request,
                    phone_number: form.phone_number,
                    username,
                    date: services.clock.today(),
                };
                // A failed save leaves the user on the agreement step
                let appointment = services.appointments.create_appointment(&request).await?;
                info!(user_id = turn.user.id, appointment_id = appointment.id, service_id = request.service_id, "Appointment booked");

                match services.settings.notification_chat() {
                    Some(admin_chat) => turn.notify(admin_chat, summary),
                    None => warn!(user_id = turn.user.id, "No admin chat configured for booking notifications"),
                }

                turn.redirect_to(BookingStep::Menu, MENU_STEP);
            }
        }
        Ok(Validation::Valid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::NextState;
    use crate::dialog::UserIdentity;

    fn turn(step: BookingStep, message: Option<&str>, callback: Option<&str>) -> Turn<BookingStep> {
        Turn::new(
            step,
            UserIdentity::new(42, Some("anna_k".to_string())),
            message.map(str::to_string),
            callback.map(str::to_string),
            Context::new(),
            Some(NextState::step("next")),
        )
    }

    #[test]
    fn test_registry_keys_follow_the_form() {
        let registry = registry();
        assert_eq!(registry.successor(ENTRY_STEP), Some(MENU_STEP));
        assert_eq!(registry.successor(MENU_STEP), Some("select_age_category"));
        assert_eq!(registry.successor("select_age_category"), Some("select_service"));
        assert_eq!(registry.successor("agreement"), None);
        assert_eq!(registry.resolve("show_service", None).unwrap(), &BookingStep::AskName);
    }

    #[test]
    fn test_category_step_requires_category_callback() {
        let step = BookingStep::ListServices;
        assert!(step.validate(&turn(step, None, Some("ZERO_SIX"))).is_valid());
        assert!(!step.validate(&turn(step, Some("ZERO_SIX"), None)).is_valid());
        assert_eq!(
            step.validate(&turn(step, None, Some("menu"))),
            Validation::Invalid("Похоже, вы не выбрали возрастную категорию. Пожалуйста выберите.".to_string())
        );
    }

    #[test]
    fn test_form_steps_require_text() {
        for step in [BookingStep::AskProblem, BookingStep::AskRequest, BookingStep::AskPhone, BookingStep::AskAgreement] {
            assert!(step.validate(&turn(step, Some("Анна"), None)).is_valid());
            assert!(!step.validate(&turn(step, None, Some("agree"))).is_valid());
            assert!(!step.validate(&turn(step, Some("   "), None)).is_valid());
        }
    }

    #[test]
    fn test_appoint_requires_agreement() {
        let step = BookingStep::Appoint;
        assert!(step.validate(&turn(step, None, Some(AGREE))).is_valid());
        assert!(!step.validate(&turn(step, Some("agree"), None)).is_valid());
    }

    #[test]
    fn test_summary_escapes_user_input() {
        let form = AppointmentForm {
            service_id: 1,
            name: "<Анна>".to_string(),
            problem: "Не спит".to_string(),
            request: "Режим".to_string(),
            phone_number: "+7 999".to_string(),
        };
        let summary = form.summary(None);
        assert!(summary.contains("<b>Имя клиента:</b> &lt;Анна&gt;"));
        assert!(summary.contains("<b>Алиас:</b> не указан"));
        assert!(form.summary(Some("anna_k")).contains("@anna_k"));
    }

    #[test]
    fn test_form_requires_every_field() {
        let mut context = Context::new();
        context.set("service_id", "3").unwrap();
        context.set("name", "Анна").unwrap();
        assert!(AppointmentForm::from_context(&context).is_err());

        context.set("problem", "a").unwrap();
        context.set("request", "b").unwrap();
        context.set("phone_number", "c").unwrap();
        let form = AppointmentForm::from_context(&context).unwrap();
        assert_eq!(form.service_id, 3);
    }
}
