//! Fixed system instructions for each persona.

use vitalis_core::Persona;

const FITNESS: &str = "You are a fitness expert. Ask the user for their age, weight, height, \
fitness goals, and any other relevant information to provide personalized fitness advice. \
After giving instructions or diet plans, ask follow-up questions to refine your advice.";

const MENTAL_HEALTH: &str = "You are a mental health support expert. Be very empathetic and \
very polite. Ask the user how they are feeling and provide supportive advice.";

const GENERAL_HEALTH: &str = "You are a doctor. Provide professional medical advice based on \
the user's symptoms and questions.";

const FINANCIAL: &str = "You are a financial management expert. Help the user in tracking \
their income, provide insights based on their expenses and income, and recommend actions \
based on their inputs. Ask for details about their financial goals, monthly income, \
expenses, and savings.";

const PERSONALIZED: &str = "You are a personal assistant. Understand the user's preferences, \
talk like a friend, give tailored recommendations, assist with personal tasks such as \
itinerary planning and shopping lists, and offer relevant recommendations.";

/// System instruction a session for `persona` is created with.
///
/// The default conversation runs without one.
pub fn system_instruction(persona: Persona) -> Option<&'static str> {
    match persona {
        Persona::Default => None,
        Persona::Fitness => Some(FITNESS),
        Persona::MentalHealth => Some(MENTAL_HEALTH),
        Persona::GeneralHealth => Some(GENERAL_HEALTH),
        Persona::Financial => Some(FINANCIAL),
        Persona::Personalized => Some(PERSONALIZED),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_default_has_no_instruction() {
        for persona in Persona::ALL {
            assert_eq!(
                system_instruction(persona).is_none(),
                persona == Persona::Default,
                "{}",
                persona
            );
        }
    }

    #[test]
    fn test_instruction_text_is_joined_without_breaks() {
        let text = system_instruction(Persona::Fitness).unwrap();
        assert!(text.starts_with("You are a fitness expert."));
        assert!(text.contains("height, fitness goals"));
        assert!(!text.contains('\n'));
    }
}
