//! Customer-facing texts
//!
//! Every reply is one plain paragraph: no lists, no markup, no line breaks. The
//! same texts feed the chat bubble and speech synthesis.

use once_cell::sync::Lazy;
use regex::Regex;
use utility_agent_config::AgentConfig;
use utility_agent_core::{Language, Service};

use crate::reactivation::Advisory;

static LIST_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(?:[-*•#>]+|\d+[.)])\s+").unwrap());
static INLINE_MARKUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*|__|`|#{2,}").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Collapse model output into one plain paragraph
pub fn flatten_paragraph(text: &str) -> String {
    let joined = text
        .lines()
        .map(|line| LIST_MARKER.replace(line, ""))
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    let plain = INLINE_MARKUP.replace_all(&joined, "");
    WHITESPACE.replace_all(plain.trim(), " ").into_owned()
}

pub fn service_label(service: Service, language: Language) -> &'static str {
    match (language, service) {
        (Language::Arabic, Service::Water) => "الماء",
        (Language::Arabic, Service::Electricity) => "الكهرباء",
        (Language::French, Service::Water) => "l'eau",
        (Language::French, Service::Electricity) => "l'électricité",
        (Language::English, Service::Water) => "water",
        (Language::English, Service::Electricity) => "electricity",
    }
}

/// "d'eau" / "d'électricité", for "contrat d'eau"
fn french_of(service: Service) -> &'static str {
    match service {
        Service::Water => "d'eau",
        Service::Electricity => "d'électricité",
    }
}

fn example_contract(service: Service) -> String {
    format!("{}XXXXXX / XXXXXXX", service.contract_prefix())
}

pub fn advisory(advisory: &Advisory, language: Language) -> String {
    let date = advisory.paid_at.format("%d/%m/%Y");
    let time = advisory.paid_at.format("%H:%M");
    let n = advisory.remaining_minutes;
    match language {
        Language::Arabic => format!(
            "تم تسجيل أداء فاتورة {} بتاريخ {} على الساعة {}، وقد تستغرق إعادة الربط حوالي {} دقيقة أخرى.",
            service_label(advisory.service, language),
            date,
            time,
            n
        ),
        Language::French => format!(
            "Votre paiement {} du {} à {} a bien été enregistré et le rétablissement peut encore prendre environ {} minute{}.",
            french_of(advisory.service),
            date,
            time,
            n,
            if n > 1 { "s" } else { "" }
        ),
        Language::English => format!(
            "Your {} payment of {} at {} has been recorded and reconnection may take about {} more minute{}.",
            service_label(advisory.service, language),
            date,
            time,
            n,
            if n > 1 { "s" } else { "" }
        ),
    }
}

pub fn maintenance(
    service: Service,
    zone_name: &str,
    outage_reason: Option<&str>,
    estimated_restoration: Option<&str>,
    language: Language,
) -> String {
    let label = service_label(service, language);
    match language {
        Language::Arabic => {
            let mut text = format!("توجد أشغال صيانة جارية في منطقة {} تؤثر على خدمة {}", zone_name, label);
            if let Some(reason) = outage_reason {
                text.push_str(&format!("، وسبب الانقطاع هو {}", reason));
            }
            text.push('.');
            if let Some(eta) = estimated_restoration {
                text.push_str(&format!(" الموعد المتوقع لعودة الخدمة هو {}.", eta));
            }
            text.push_str(" نعتذر عن الإزعاج، وفرقنا تعمل على إعادة الخدمة في أقرب وقت.");
            text
        }
        Language::French => {
            let mut text = format!(
                "Des travaux de maintenance sont en cours dans la zone {} et touchent la distribution de {}",
                zone_name, label
            );
            if let Some(reason) = outage_reason {
                text.push_str(&format!(", en raison de : {}", reason));
            }
            text.push('.');
            if let Some(eta) = estimated_restoration {
                text.push_str(&format!(" Le rétablissement est prévu pour {}.", eta));
            }
            text.push_str(" Nous nous excusons pour la gêne occasionnée, nos équipes font le nécessaire pour rétablir le service au plus vite.");
            text
        }
        Language::English => {
            let mut text = format!(
                "Maintenance work is in progress in the {} area and is affecting the {} supply",
                zone_name, label
            );
            if let Some(reason) = outage_reason {
                text.push_str(&format!(" because of {}", reason));
            }
            text.push('.');
            if let Some(eta) = estimated_restoration {
                text.push_str(&format!(" Service is expected back by {}.", eta));
            }
            text.push_str(" We apologise for the inconvenience and our teams are working to restore service as soon as possible.");
            text
        }
    }
}

pub fn no_maintenance(service: Service, zone_name: &str, language: Language) -> String {
    let label = service_label(service, language);
    match language {
        Language::Arabic => format!(
            "لا توجد حالياً أي أشغال صيانة تؤثر على خدمة {} في منطقة {}.",
            label, zone_name
        ),
        Language::French => format!(
            "Aucune maintenance touchant {} n'est en cours actuellement dans la zone {}.",
            label, zone_name
        ),
        Language::English => format!(
            "There is currently no maintenance affecting {} in the {} area.",
            label, zone_name
        ),
    }
}

pub fn payments_current(service: Service, language: Language) -> String {
    let label = service_label(service, language);
    match language {
        Language::Arabic => format!("أداءاتك الخاصة بخدمة {} محينة ولا يوجد أي مبلغ مستحق.", label),
        Language::French => format!("Vos paiements pour {} sont à jour, aucun montant n'est dû.", label),
        Language::English => format!("Your {} payments are up to date with nothing outstanding.", label),
    }
}

pub fn unpaid(
    service: Service,
    contract_number: &str,
    balance: f64,
    language: Language,
    agent: &AgentConfig,
) -> String {
    let label = service_label(service, language);
    let company = &agent.company_name;
    match language {
        Language::Arabic => {
            let debt = if balance > 0.0 {
                format!("يوجد مبلغ غير مؤدى قدره {:.2} درهم", balance)
            } else {
                "توجد فاتورة غير مؤداة".to_string()
            };
            format!(
                "{} على عقد {} رقم {}، وهذا هو سبب انقطاع الخدمة. يمكنك الأداء عبر تطبيق {} على الهاتف، أو لدى وكالات الأداء مثل وفاكاش وكاش بلوس، أو عبر البنك. يرجى العلم أن إعادة الربط ليست فورية بعد الأداء.",
                debt, label, contract_number, company
            )
        }
        Language::French => {
            let debt = if balance > 0.0 {
                format!("un montant impayé de {:.2} MAD", balance)
            } else {
                "une facture impayée".to_string()
            };
            format!(
                "Votre contrat {} numéro {} présente {}, ce qui explique la coupure. Vous pouvez payer via l'application mobile {}, dans les agences de paiement comme Wafacash ou Cash Plus, ou auprès de votre banque. Notez que le rétablissement n'est pas instantané après le paiement.",
                french_of(service), contract_number, debt, company
            )
        }
        Language::English => {
            let debt = if balance > 0.0 {
                format!("an unpaid balance of {:.2} MAD", balance)
            } else {
                "an unpaid bill".to_string()
            };
            format!(
                "Your {} contract {} has {}, which is why the service is interrupted. You can pay through the {} mobile app, at payment agencies such as Wafacash or Cash Plus, or at your bank. Please note that reconnection is not instantaneous after payment.",
                label, contract_number, debt, company
            )
        }
    }
}

/// `cut` is `Some(reason)` when the store records the service as disconnected
pub fn technical_unknown(
    service: Service,
    cut: Option<&str>,
    language: Language,
    agent: &AgentConfig,
) -> String {
    let label = service_label(service, language);
    let phone = &agent.support_phone;
    match language {
        Language::Arabic => {
            let mut text = format!(
                "أداءاتك الخاصة بخدمة {} محينة ولا توجد أي أشغال صيانة في منطقتك، لذلك فالأرجح أن الأمر يتعلق بعطل تقني محلي.",
                label
            );
            if let Some(reason) = cut {
                text.push_str(" تشير سجلاتنا مع ذلك إلى أن الخدمة مقطوعة");
                if !reason.is_empty() {
                    text.push_str(&format!(" ({})", reason));
                }
                text.push('.');
            }
            text.push_str(&format!(" من فضلك اتصل بالدعم التقني على الرقم {}.", phone));
            text
        }
        Language::French => {
            let mut text = format!(
                "Vos paiements pour {} sont à jour et aucune maintenance n'est en cours dans votre zone, il s'agit donc probablement d'un problème technique local.",
                label
            );
            if let Some(reason) = cut {
                text.push_str(" Nos registres indiquent toutefois que le service est coupé");
                if !reason.is_empty() {
                    text.push_str(&format!(" ({})", reason));
                }
                text.push('.');
            }
            text.push_str(&format!(" Merci de contacter le support technique au {}.", phone));
            text
        }
        Language::English => {
            let mut text = format!(
                "Your {} payments are up to date and there is no maintenance in your area, so this is most likely a local technical issue.",
                label
            );
            if let Some(reason) = cut {
                text.push_str(" Our records do show the service as disconnected");
                if !reason.is_empty() {
                    text.push_str(&format!(" ({})", reason));
                }
                text.push('.');
            }
            text.push_str(&format!(" Please call technical support on {}.", phone));
            text
        }
    }
}

pub fn ask_contract(service: Service, language: Language) -> String {
    let example = example_contract(service);
    match language {
        Language::Arabic => format!(
            "من فضلك أرسل رقم عقد {} الخاص بك (مثال: {})، أو أرسل صورة واضحة لفاتورة {} وسأستخرج الرقم منها.",
            service_label(service, language),
            example,
            service_label(service, language)
        ),
        Language::French => format!(
            "Merci de m'envoyer votre numéro de contrat {} (par exemple {}) ou une photo de votre facture {} et je le lirai pour vous.",
            french_of(service),
            example,
            french_of(service)
        ),
        Language::English => format!(
            "Please send your {} contract number (for example {}) or a photo of your {} bill and I will read it for you.",
            service_label(service, language),
            example,
            service_label(service, language)
        ),
    }
}

pub fn mismatch(expected: Service, contract: &str, language: Language) -> String {
    let found = expected.other();
    let prefix = expected.contract_prefix();
    match language {
        Language::Arabic => format!(
            "الرقم {} هو رقم عقد {}، بينما طلبك يخص {}. من فضلك أرسل رقم عقد {} الذي يبدأ بـ {}، أو صورة لفاتورة {}.",
            contract,
            service_label(found, language),
            service_label(expected, language),
            service_label(expected, language),
            prefix,
            service_label(expected, language)
        ),
        Language::French => format!(
            "Le numéro {} correspond à un contrat {}, alors que votre demande concerne {}. Merci d'envoyer votre numéro de contrat {}, qui commence par {}, ou une photo de votre facture {}.",
            contract,
            french_of(found),
            service_label(expected, language),
            french_of(expected),
            prefix,
            french_of(expected)
        ),
        Language::English => format!(
            "The number {} is {} contract, but your request is about {}. Please send your {} contract number, which starts with {}, or a photo of your {} bill.",
            contract,
            match found {
                Service::Water => "a water",
                Service::Electricity => "an electricity",
            },
            service_label(expected, language),
            service_label(expected, language),
            prefix,
            service_label(expected, language)
        ),
    }
}

pub fn not_found(service: Service, input: &str, language: Language) -> String {
    match language {
        Language::Arabic => format!(
            "لم أجد أي حساب {} مرتبط بالرقم {}. من فضلك تحقق من الرقم أو أرسل صورة لفاتورتك.",
            service_label(service, language),
            input
        ),
        Language::French => format!(
            "Je n'ai trouvé aucun contrat {} correspondant au numéro {}. Merci de vérifier le numéro ou d'envoyer une photo de votre facture.",
            french_of(service),
            input
        ),
        Language::English => format!(
            "I could not find any {} account for the number {}. Please check the number or send a photo of your bill.",
            service_label(service, language),
            input
        ),
    }
}

pub fn apology(language: Language, agent: &AgentConfig) -> String {
    let phone = &agent.support_phone;
    match language {
        Language::Arabic => format!(
            "عذراً، حدث خطأ تقني أثناء معالجة طلبك. من فضلك حاول مرة أخرى بعد قليل، أو اتصل بخدمة العملاء على الرقم {}.",
            phone
        ),
        Language::French => format!(
            "Désolé, une erreur technique est survenue lors du traitement de votre demande. Merci de réessayer dans quelques instants ou d'appeler le service client au {}.",
            phone
        ),
        Language::English => format!(
            "Sorry, a technical error occurred while handling your request. Please try again in a moment or call customer service on {}.",
            phone
        ),
    }
}
